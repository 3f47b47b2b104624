//! The resolution/pattern history collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use volley_core::errors::StoreError;
use volley_core::history::{ResolutionRecord, RoutingPattern};

/// History-store interface the aggregator depends on.
///
/// Retrieval is read-only: success counts and routing confidence evolve
/// only through the store's own explicit operations, never as a side
/// effect of a search. Implementations must support concurrent reads.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Resolution records matching a keyword, optionally narrowed by system.
    async fn search_resolutions(
        &self,
        keyword: &str,
        system_name: Option<&str>,
    ) -> Result<Vec<ResolutionRecord>, StoreError>;

    /// Best learned routing pattern for a key, if one exists.
    async fn find_routing_pattern(&self, key: &str)
        -> Result<Option<RoutingPattern>, StoreError>;
}

#[async_trait]
impl<T: HistoryStore> HistoryStore for Arc<T> {
    async fn search_resolutions(
        &self,
        keyword: &str,
        system_name: Option<&str>,
    ) -> Result<Vec<ResolutionRecord>, StoreError> {
        (**self).search_resolutions(keyword, system_name).await
    }

    async fn find_routing_pattern(
        &self,
        key: &str,
    ) -> Result<Option<RoutingPattern>, StoreError> {
        (**self).find_routing_pattern(key).await
    }
}
