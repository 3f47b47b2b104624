//! SQL data access for entities, history, and the lob archive.
//!
//! All methods take a `&Connection` parameter and are stateless — pure
//! functions translating between Rust types and SQL. Generated IDs are
//! prefixed UUID v7 (time-ordered).

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use volley_core::entity::{EntityMatch, EntityType};
use volley_core::history::{ResolutionRecord, RoutingPattern};
use volley_core::ids::{EntityId, PatternId, RecordId, SenderId};
use volley_core::lob::RawLob;
use volley_resolve::NewEntity;

use crate::errors::StorageError;

/// Candidates returned when the LIKE prefilter finds nothing.
const TYPE_SCAN_LIMIT: u32 = 25;

/// Generate a prefixed UUID v7 ID.
fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7())
}

/// Current UTC timestamp as ISO 8601.
fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<EntityMatch> {
    Ok(EntityMatch {
        id: EntityId::from(row.get::<_, String>("id")?),
        name: row.get("name")?,
        confidence: row.get("confidence")?,
        role: row.get("role")?,
        email: row.get("email")?,
    })
}

fn resolution_from_row(row: &Row<'_>) -> rusqlite::Result<ResolutionRecord> {
    Ok(ResolutionRecord {
        id: RecordId::from(row.get::<_, String>("id")?),
        problem_pattern: row.get("problem_pattern")?,
        solution: row.get("solution")?,
        system_name: row.get("system_name")?,
        success_count: row.get("success_count")?,
    })
}

fn routing_from_row(row: &Row<'_>) -> rusqlite::Result<RoutingPattern> {
    Ok(RoutingPattern {
        id: PatternId::from(row.get::<_, String>("id")?),
        key: row.get("key")?,
        assignee_id: SenderId::from(row.get::<_, String>("assignee_id")?),
        confidence: row.get("confidence")?,
        times_used: row.get("times_used")?,
        times_confirmed: row.get("times_confirmed")?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// Knowledge-base entity access.
pub struct EntityRepository;

impl EntityRepository {
    /// Insert a new entity and return its stored form.
    pub fn insert(conn: &Connection, entity: &NewEntity) -> Result<EntityMatch, StorageError> {
        let id = generate_id("ent");
        let now = now_iso();
        let _ = conn.execute(
            "INSERT INTO entities (id, name, entity_type, role, email, confidence, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id,
                entity.name,
                entity.entity_type.to_string(),
                entity.role,
                entity.email,
                entity.confidence,
                now,
            ],
        )?;
        Ok(EntityMatch {
            id: EntityId::from(id),
            name: entity.name.clone(),
            confidence: entity.confidence,
            role: entity.role.clone(),
            email: entity.email.clone(),
        })
    }

    /// Candidate entities of a type for a mention.
    ///
    /// LIKE prefilter on the name first; when that finds nothing, fall back
    /// to a bounded scan of the type so the fuzzy scorer still has material
    /// to rank (a typo'd mention matches no substring).
    pub fn find_candidates(
        conn: &Connection,
        entity_type: EntityType,
        mention: &str,
    ) -> Result<Vec<EntityMatch>, StorageError> {
        let pattern = format!("%{}%", mention.trim());
        let mut stmt = conn.prepare(
            "SELECT id, name, confidence, role, email FROM entities
             WHERE entity_type = ?1 AND name LIKE ?2 COLLATE NOCASE",
        )?;
        let matched: Vec<EntityMatch> = stmt
            .query_map(params![entity_type.to_string(), pattern], entity_from_row)?
            .collect::<rusqlite::Result<_>>()?;

        if !matched.is_empty() {
            return Ok(matched);
        }

        let mut stmt = conn.prepare(
            "SELECT id, name, confidence, role, email FROM entities
             WHERE entity_type = ?1 LIMIT ?2",
        )?;
        let scanned: Vec<EntityMatch> = stmt
            .query_map(params![entity_type.to_string(), TYPE_SCAN_LIMIT], entity_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(scanned)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// History
// ─────────────────────────────────────────────────────────────────────────────

/// Resolution-history and routing-pattern access.
pub struct HistoryRepository;

impl HistoryRepository {
    /// Record a new problem → fix pair.
    pub fn insert_resolution(
        conn: &Connection,
        problem_pattern: &str,
        solution: &str,
        system_name: Option<&str>,
    ) -> Result<ResolutionRecord, StorageError> {
        let id = generate_id("res");
        let _ = conn.execute(
            "INSERT INTO resolution_records (id, problem_pattern, solution, system_name, success_count, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![id, problem_pattern, solution, system_name, now_iso()],
        )?;
        Ok(ResolutionRecord {
            id: RecordId::from(id),
            problem_pattern: problem_pattern.to_string(),
            solution: solution.to_string(),
            system_name: system_name.map(str::to_string),
            success_count: 0,
        })
    }

    /// Get one resolution record.
    pub fn get_resolution(
        conn: &Connection,
        id: &RecordId,
    ) -> Result<Option<ResolutionRecord>, StorageError> {
        Ok(conn
            .query_row(
                "SELECT id, problem_pattern, solution, system_name, success_count
                 FROM resolution_records WHERE id = ?1",
                params![id.as_str()],
                resolution_from_row,
            )
            .optional()?)
    }

    /// Records whose problem or solution contains the keyword, or whose
    /// system matches the optional system name. Unranked — scoring belongs
    /// to the aggregator.
    pub fn search_resolutions(
        conn: &Connection,
        keyword: &str,
        system_name: Option<&str>,
    ) -> Result<Vec<ResolutionRecord>, StorageError> {
        let pattern = format!("%{}%", keyword.trim());
        let mut stmt = conn.prepare(
            "SELECT id, problem_pattern, solution, system_name, success_count
             FROM resolution_records
             WHERE problem_pattern LIKE ?1 COLLATE NOCASE
                OR solution LIKE ?1 COLLATE NOCASE
                OR (?2 IS NOT NULL AND system_name = ?2 COLLATE NOCASE)
             ORDER BY id",
        )?;
        let records: Vec<ResolutionRecord> = stmt
            .query_map(params![pattern, system_name], resolution_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(records)
    }

    /// Record a confirmed success for a resolution, idempotently.
    ///
    /// The completion token identifies the task completion that triggered
    /// the confirmation; replaying the same token does not increment again.
    /// Returns whether the count was incremented.
    pub fn record_success(
        conn: &Connection,
        id: &RecordId,
        completion_token: &str,
    ) -> Result<bool, StorageError> {
        if Self::get_resolution(conn, id)?.is_none() {
            return Err(StorageError::not_found("resolution record", id.as_str()));
        }

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO resolution_successes (record_id, completion_token, recorded_at)
             VALUES (?1, ?2, ?3)",
            params![id.as_str(), completion_token, now_iso()],
        )?;
        if inserted == 0 {
            return Ok(false);
        }

        let _ = conn.execute(
            "UPDATE resolution_records SET success_count = success_count + 1 WHERE id = ?1",
            params![id.as_str()],
        )?;
        Ok(true)
    }

    // ─── Routing patterns ────────────────────────────────────────────────

    /// Best routing pattern for a key.
    pub fn find_routing_pattern(
        conn: &Connection,
        key: &str,
    ) -> Result<Option<RoutingPattern>, StorageError> {
        Ok(conn
            .query_row(
                "SELECT id, key, assignee_id, confidence, times_used, times_confirmed
                 FROM routing_patterns WHERE key = ?1 COLLATE NOCASE",
                params![key],
                routing_from_row,
            )
            .optional()?)
    }

    /// Learn a routing for a key, or return the existing one.
    pub fn learn_routing(
        conn: &Connection,
        key: &str,
        assignee_id: &SenderId,
        initial_confidence: f64,
    ) -> Result<RoutingPattern, StorageError> {
        if let Some(existing) = Self::find_routing_pattern(conn, key)? {
            return Ok(existing);
        }
        let id = generate_id("pat");
        let key = key.to_lowercase();
        let _ = conn.execute(
            "INSERT INTO routing_patterns (id, key, assignee_id, confidence, times_used, times_confirmed, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, 0, ?5)",
            params![id, key, assignee_id.as_str(), initial_confidence, now_iso()],
        )?;
        Ok(RoutingPattern {
            id: PatternId::from(id),
            key,
            assignee_id: assignee_id.clone(),
            confidence: initial_confidence,
            times_used: 0,
            times_confirmed: 0,
        })
    }

    /// Note that a pattern was applied (usage counter only — confidence
    /// never moves silently).
    pub fn touch_routing(conn: &Connection, key: &str) -> Result<(), StorageError> {
        let _ = conn.execute(
            "UPDATE routing_patterns SET times_used = times_used + 1, updated_at = ?2
             WHERE key = ?1 COLLATE NOCASE",
            params![key, now_iso()],
        )?;
        Ok(())
    }

    /// Apply an explicit confirmation: confidence rises by `step`, capped.
    pub fn confirm_routing(
        conn: &Connection,
        key: &str,
        step: f64,
    ) -> Result<Option<RoutingPattern>, StorageError> {
        let Some(pattern) = Self::find_routing_pattern(conn, key)? else {
            return Ok(None);
        };
        let updated = pattern.confirmed(step);
        Self::write_confidence(conn, &updated)?;
        Ok(Some(updated))
    }

    /// Apply a conflicting assignment: confidence drops by `step`, floored.
    pub fn record_routing_conflict(
        conn: &Connection,
        key: &str,
        step: f64,
    ) -> Result<Option<RoutingPattern>, StorageError> {
        let Some(pattern) = Self::find_routing_pattern(conn, key)? else {
            return Ok(None);
        };
        let updated = pattern.conflicted(step);
        Self::write_confidence(conn, &updated)?;
        Ok(Some(updated))
    }

    fn write_confidence(conn: &Connection, pattern: &RoutingPattern) -> Result<(), StorageError> {
        let _ = conn.execute(
            "UPDATE routing_patterns
             SET confidence = ?2, times_confirmed = ?3, updated_at = ?4
             WHERE id = ?1",
            params![
                pattern.id.as_str(),
                pattern.confidence,
                pattern.times_confirmed,
                now_iso(),
            ],
        )?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lob archive
// ─────────────────────────────────────────────────────────────────────────────

/// Archive of submitted lobs.
pub struct LobRepository;

impl LobRepository {
    /// Archive a lob. An explicit, observable operation — callers decide
    /// whether a failure is logged-and-continued or propagated.
    pub fn archive(conn: &Connection, lob: &RawLob) -> Result<(), StorageError> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO lobs (id, text, sender_id, workspace_id, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                lob.id.as_str(),
                lob.text,
                lob.sender_id.as_str(),
                lob.workspace_id.as_str(),
                lob.submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch an archived lob's text by ID.
    pub fn get_text(conn: &Connection, id: &str) -> Result<Option<String>, StorageError> {
        Ok(conn
            .query_row(
                "SELECT text FROM lobs WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
