//! # volley-core
//!
//! Foundation types for the Volley enrichment core: branded IDs, the lob and
//! task data model, entity resolution wrappers, history records, and the
//! portable retry building blocks shared by the provider and pipeline crates.
//!
//! ## Immutability
//!
//! A [`RawLob`] is created at submission and never mutated. Extraction
//! produces [`ExtractedEntity`] values that likewise stay immutable:
//! resolution wraps them in [`ResolvedEntity`] or [`AmbiguousEntity`]
//! rather than annotating them in place.

#![deny(unsafe_code)]

pub mod entity;
pub mod errors;
pub mod history;
pub mod ids;
pub mod lob;
pub mod logging;
pub mod retry;
pub mod task;

pub use entity::{
    AmbiguousEntity, EntityMatch, EntityType, ExtractedEntity, ResolutionOutcome, ResolvedEntity,
};
pub use errors::StoreError;
pub use history::{ResolutionRecord, RoutingPattern};
pub use ids::{EntityId, LobId, PatternId, RecordId, SenderId, WorkspaceId};
pub use lob::RawLob;
pub use retry::RetryConfig;
pub use task::{ParsedTask, TaskClassification, Urgency};
