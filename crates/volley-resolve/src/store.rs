//! The backing knowledge-store collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use volley_core::entity::{EntityMatch, EntityType};
use volley_core::errors::StoreError;

/// A brand-new entity to register, typically created when a human resolves
/// an unknown ambiguous mention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntity {
    /// Canonical name.
    pub name: String,
    /// Entity kind.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Role metadata, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Contact field, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Seed confidence for the new record.
    pub confidence: f64,
}

/// Knowledge-store interface the resolver depends on.
///
/// Candidates come back unordered; scoring and ranking are the resolver's
/// job. Implementations must support concurrent reads.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Candidate records of the given type for a mention.
    async fn find_candidates(
        &self,
        entity_type: EntityType,
        mention: &str,
    ) -> Result<Vec<EntityMatch>, StoreError>;

    /// Register a brand-new entity, returning its assigned identity.
    async fn add_entity(&self, entity: &NewEntity) -> Result<EntityMatch, StoreError>;
}

#[async_trait]
impl<T: EntityStore> EntityStore for Arc<T> {
    async fn find_candidates(
        &self,
        entity_type: EntityType,
        mention: &str,
    ) -> Result<Vec<EntityMatch>, StoreError> {
        (**self).find_candidates(entity_type, mention).await
    }

    async fn add_entity(&self, entity: &NewEntity) -> Result<EntityMatch, StoreError> {
        (**self).add_entity(entity).await
    }
}
