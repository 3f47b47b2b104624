//! Async adapter: connection pool plus `spawn_blocking` over the
//! repositories, implementing the collaborator traits.

use std::path::Path;

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::warn;

use volley_core::entity::{EntityMatch, EntityType};
use volley_core::errors::StoreError;
use volley_core::history::{ResolutionRecord, RoutingPattern};
use volley_core::ids::{RecordId, SenderId};
use volley_core::lob::RawLob;
use volley_memory::HistoryStore;
use volley_resolve::{EntityStore, NewEntity};

use crate::errors::StorageError;
use crate::repository::{EntityRepository, HistoryRepository, LobRepository};
use crate::schema;

/// SQLite-backed knowledge and history stores sharing one pool.
#[derive(Clone)]
pub struct SqliteStores {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStores {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::new(manager)?;
        schema::migrate(&*pool.get()?)?;
        Ok(Self { pool })
    }

    /// Run a repository closure on a pooled connection off the async runtime.
    async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| StoreError::new(operation, e.to_string()))?;
            f(&conn).map_err(|e| StoreError::new(operation, e.to_string()))
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(join_err) => Err(StoreError::new(operation, join_err.to_string())),
        }
    }

    // ─── Explicit lifecycle operations ───────────────────────────────────

    /// Archive a lob for later reference.
    ///
    /// The result tells the caller whether the write happened; a failure
    /// can be logged-and-continued or propagated, never silently swallowed.
    pub async fn archive_lob(&self, lob: &RawLob) -> Result<(), StoreError> {
        let lob = lob.clone();
        let result = self
            .run("archive_lob", move |conn| LobRepository::archive(conn, &lob))
            .await;
        if let Err(e) = &result {
            warn!(error = %e, "lob archive failed");
        }
        result
    }

    /// Record a new problem → fix pair.
    pub async fn insert_resolution(
        &self,
        problem_pattern: String,
        solution: String,
        system_name: Option<String>,
    ) -> Result<ResolutionRecord, StoreError> {
        self.run("insert_resolution", move |conn| {
            HistoryRepository::insert_resolution(
                conn,
                &problem_pattern,
                &solution,
                system_name.as_deref(),
            )
        })
        .await
    }

    /// Idempotently record a confirmed success for a resolution.
    pub async fn record_success(
        &self,
        id: RecordId,
        completion_token: String,
    ) -> Result<bool, StoreError> {
        self.run("record_success", move |conn| {
            HistoryRepository::record_success(conn, &id, &completion_token)
        })
        .await
    }

    /// Learn a routing pattern for a key (no-op if one exists).
    pub async fn learn_routing(
        &self,
        key: String,
        assignee_id: SenderId,
        initial_confidence: f64,
    ) -> Result<RoutingPattern, StoreError> {
        self.run("learn_routing", move |conn| {
            HistoryRepository::learn_routing(conn, &key, &assignee_id, initial_confidence)
        })
        .await
    }

    /// Apply an explicit routing confirmation.
    pub async fn confirm_routing(
        &self,
        key: String,
        step: f64,
    ) -> Result<Option<RoutingPattern>, StoreError> {
        self.run("confirm_routing", move |conn| {
            HistoryRepository::confirm_routing(conn, &key, step)
        })
        .await
    }

    /// Apply a conflicting routing assignment.
    pub async fn record_routing_conflict(
        &self,
        key: String,
        step: f64,
    ) -> Result<Option<RoutingPattern>, StoreError> {
        self.run("record_routing_conflict", move |conn| {
            HistoryRepository::record_routing_conflict(conn, &key, step)
        })
        .await
    }
}

#[async_trait]
impl EntityStore for SqliteStores {
    async fn find_candidates(
        &self,
        entity_type: EntityType,
        mention: &str,
    ) -> Result<Vec<EntityMatch>, StoreError> {
        let mention = mention.to_string();
        self.run("find_candidates", move |conn| {
            EntityRepository::find_candidates(conn, entity_type, &mention)
        })
        .await
    }

    async fn add_entity(&self, entity: &NewEntity) -> Result<EntityMatch, StoreError> {
        let entity = entity.clone();
        self.run("add_entity", move |conn| {
            EntityRepository::insert(conn, &entity)
        })
        .await
    }
}

#[async_trait]
impl HistoryStore for SqliteStores {
    async fn search_resolutions(
        &self,
        keyword: &str,
        system_name: Option<&str>,
    ) -> Result<Vec<ResolutionRecord>, StoreError> {
        let keyword = keyword.to_string();
        let system_name = system_name.map(str::to_string);
        self.run("search_resolutions", move |conn| {
            HistoryRepository::search_resolutions(conn, &keyword, system_name.as_deref())
        })
        .await
    }

    async fn find_routing_pattern(
        &self,
        key: &str,
    ) -> Result<Option<RoutingPattern>, StoreError> {
        let key = key.to_string();
        self.run("find_routing_pattern", move |conn| {
            HistoryRepository::find_routing_pattern(conn, &key)
        })
        .await
    }
}
