//! Entity mentions and their resolution wrappers.
//!
//! An [`ExtractedEntity`] is what the parser found in the text. It is never
//! mutated: resolution wraps it in a [`ResolvedEntity`] (a confident link to
//! a store record) or an [`AmbiguousEntity`] (candidates plus a clarification
//! question). [`ResolutionOutcome`] is the tagged union of the two — every
//! input entity maps to exactly one outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::EntityId;

/// Closed set of entity kinds the parser may emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A person (teammate, contact, client).
    Person,
    /// A company or organization.
    Company,
    /// A named system or tool (e.g. "WordPress").
    System,
    /// An account or login.
    Account,
    /// A date or deadline expression.
    Date,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => write!(f, "person"),
            Self::Company => write!(f, "company"),
            Self::System => write!(f, "system"),
            Self::Account => write!(f, "account"),
            Self::Date => write!(f, "date"),
        }
    }
}

/// A mention of a person/company/system/account/date found in a lob.
///
/// Immutable once produced by the parser. `confidence` is the model's own
/// certainty that this is a real entity, in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntity {
    /// Verbatim mention text.
    pub mention: String,
    /// Entity kind.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Role of the mention in the lob (assignee, mentioned, deadline, ...).
    pub role: String,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Supporting phrases from the surrounding text.
    #[serde(default)]
    pub context_clues: Vec<String>,
}

/// A candidate record from the backing knowledge store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMatch {
    /// Store identifier.
    pub id: EntityId,
    /// Canonical name.
    pub name: String,
    /// Match confidence in `[0, 1]` (combined string-similarity and stored trust).
    pub confidence: f64,
    /// Known role metadata, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Contact/descriptive field, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An entity confidently linked to a store record.
///
/// Construction guarantees `resolved_to`/`resolved_name` are present, which
/// is the typed form of the "resolved implies non-null" invariant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntity {
    /// The original extracted mention, unchanged.
    pub entity: ExtractedEntity,
    /// Always `true`; kept on the wire for consumers that branch on it.
    pub resolved: bool,
    /// Store identifier the mention resolved to.
    pub resolved_to: EntityId,
    /// Canonical name of the resolved record.
    pub resolved_name: String,
    /// Resolution confidence, distinct from extraction confidence.
    pub confidence: f64,
    /// Non-trivial runners-up surfaced for audit/undo (at most 2).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<EntityMatch>,
}

impl ResolvedEntity {
    /// Resolve with a clear winner and no alternates.
    #[must_use]
    pub fn certain(entity: ExtractedEntity, winner: &EntityMatch) -> Self {
        Self {
            entity,
            resolved: true,
            resolved_to: winner.id.clone(),
            resolved_name: winner.name.clone(),
            confidence: winner.confidence,
            alternates: Vec::new(),
        }
    }

    /// Resolve with a clear winner but surface runners-up.
    #[must_use]
    pub fn with_alternates(
        entity: ExtractedEntity,
        winner: &EntityMatch,
        alternates: Vec<EntityMatch>,
    ) -> Self {
        Self {
            alternates,
            ..Self::certain(entity, winner)
        }
    }

    /// Trivial resolution for dates: the mention resolves to itself with
    /// full confidence, no store lookup.
    #[must_use]
    pub fn date(entity: ExtractedEntity) -> Self {
        let mention = entity.mention.clone();
        Self {
            entity,
            resolved: true,
            resolved_to: EntityId::from(mention.clone()),
            resolved_name: mention,
            confidence: 1.0,
            alternates: Vec::new(),
        }
    }
}

/// An entity that could not be auto-resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguousEntity {
    /// The original extracted mention, unchanged.
    pub entity: ExtractedEntity,
    /// Candidate matches sorted by confidence descending, at most 4.
    #[serde(default)]
    pub possible_matches: Vec<EntityMatch>,
    /// Human-readable prompt to disambiguate.
    pub clarification_question: String,
    /// Set when the entity is ambiguous because a store lookup failed,
    /// not because the mention is unknown.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl AmbiguousEntity {
    /// No candidates found — a genuinely unknown mention.
    #[must_use]
    pub fn unknown(entity: ExtractedEntity, clarification_question: String) -> Self {
        Self {
            entity,
            possible_matches: Vec::new(),
            clarification_question,
            degraded: false,
        }
    }

    /// Multiple viable candidates or no clear winner.
    #[must_use]
    pub fn contested(
        entity: ExtractedEntity,
        possible_matches: Vec<EntityMatch>,
        clarification_question: String,
    ) -> Self {
        Self {
            entity,
            possible_matches,
            clarification_question,
            degraded: false,
        }
    }

    /// The store lookup failed; surfaced instead of failing the pipeline.
    #[must_use]
    pub fn degraded(entity: ExtractedEntity, note: String) -> Self {
        Self {
            entity,
            possible_matches: Vec::new(),
            clarification_question: note,
            degraded: true,
        }
    }

    /// Apply a human's choice: consume the ambiguity and produce a
    /// [`ResolvedEntity`] at full confidence.
    ///
    /// Pure — no store interaction. Registering a brand-new entity for an
    /// unknown mention goes through the resolver's `add_entity` instead.
    #[must_use]
    pub fn select(self, chosen: &EntityMatch) -> ResolvedEntity {
        ResolvedEntity {
            entity: self.entity,
            resolved: true,
            resolved_to: chosen.id.clone(),
            resolved_name: chosen.name.clone(),
            confidence: 1.0,
            alternates: Vec::new(),
        }
    }
}

/// Outcome of resolving a single entity: exactly one variant per input.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolutionOutcome {
    /// Confidently linked to a store record.
    Resolved(ResolvedEntity),
    /// Needs human disambiguation.
    Ambiguous(AmbiguousEntity),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(mention: &str, entity_type: EntityType) -> ExtractedEntity {
        ExtractedEntity {
            mention: mention.into(),
            entity_type,
            role: "mentioned".into(),
            confidence: 0.9,
            context_clues: vec![],
        }
    }

    fn candidate(id: &str, name: &str, confidence: f64) -> EntityMatch {
        EntityMatch {
            id: EntityId::from(id),
            name: name.into(),
            confidence,
            role: None,
            email: None,
        }
    }

    #[test]
    fn entity_type_serde() {
        let json = serde_json::to_string(&EntityType::Person).unwrap();
        assert_eq!(json, "\"person\"");
        let back: EntityType = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(back, EntityType::System);
    }

    #[test]
    fn extracted_entity_type_field_name() {
        let e = entity("Sarah", EntityType::Person);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "person");
        assert_eq!(json["mention"], "Sarah");
    }

    #[test]
    fn certain_carries_winner_identity() {
        let winner = candidate("ent-1", "Sarah Chen", 0.95);
        let resolved = ResolvedEntity::certain(entity("Sarah", EntityType::Person), &winner);
        assert!(resolved.resolved);
        assert_eq!(resolved.resolved_to.as_str(), "ent-1");
        assert_eq!(resolved.resolved_name, "Sarah Chen");
        assert!(resolved.alternates.is_empty());
    }

    #[test]
    fn with_alternates_keeps_winner() {
        let winner = candidate("ent-1", "Sarah Chen", 0.95);
        let alt = candidate("ent-2", "Sara Khan", 0.6);
        let resolved = ResolvedEntity::with_alternates(
            entity("Sarah", EntityType::Person),
            &winner,
            vec![alt],
        );
        assert_eq!(resolved.resolved_to.as_str(), "ent-1");
        assert_eq!(resolved.alternates.len(), 1);
    }

    #[test]
    fn date_resolves_to_its_own_mention() {
        let resolved = ResolvedEntity::date(entity("next Friday", EntityType::Date));
        assert_eq!(resolved.resolved_name, "next Friday");
        assert_eq!(resolved.resolved_to.as_str(), "next Friday");
        assert!((resolved.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn select_produces_full_confidence_resolution() {
        let ambiguous = AmbiguousEntity::contested(
            entity("Sarah", EntityType::Person),
            vec![
                candidate("ent-1", "Sarah Chen", 0.8),
                candidate("ent-2", "Sara Khan", 0.75),
            ],
            "Which Sarah did you mean?".into(),
        );
        let chosen = ambiguous.possible_matches[1].clone();
        let resolved = ambiguous.select(&chosen);
        assert_eq!(resolved.resolved_to.as_str(), "ent-2");
        assert!((resolved.confidence - 1.0).abs() < f64::EPSILON);
        assert!(resolved.alternates.is_empty());
    }

    #[test]
    fn degraded_flag_serialization() {
        let plain = AmbiguousEntity::unknown(entity("Bob", EntityType::Person), "Who is Bob?".into());
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("degraded"));

        let degraded = AmbiguousEntity::degraded(
            entity("Bob", EntityType::Person),
            "Lookup for Bob failed; please pick manually".into(),
        );
        let json = serde_json::to_string(&degraded).unwrap();
        assert!(json.contains("\"degraded\":true"));
    }

    #[test]
    fn resolved_entity_wire_shape() {
        let winner = candidate("ent-1", "Acme Corp", 0.92);
        let resolved = ResolvedEntity::certain(entity("acme", EntityType::Company), &winner);
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["resolved"], true);
        assert_eq!(json["resolvedTo"], "ent-1");
        assert_eq!(json["resolvedName"], "Acme Corp");
        assert!(json.get("alternates").is_none());
    }
}
