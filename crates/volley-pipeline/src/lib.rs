//! # volley-pipeline
//!
//! The top-level enrichment orchestrator. One call takes a raw lob through
//! parse → entity resolution + memory aggregation → assembled
//! [`EnrichedLob`].
//!
//! ## Failure semantics
//!
//! - Parse failure fails the whole call — nothing downstream is meaningful
//!   without tasks.
//! - Resolution and aggregation degrade per-entity / per-keyword; their
//!   partial failures never abort the enrichment.
//! - Cancellation is all-or-nothing: a cancelled call returns
//!   [`PipelineError::Cancelled`] and no partial result, even though
//!   internal sub-failures are tolerated when not cancelled.

#![deny(unsafe_code)]

pub mod error;
pub mod pipeline;
pub mod types;

pub use error::PipelineError;
pub use pipeline::ContextEnrichmentPipeline;
pub use types::{EnrichedLob, EntityResolutionReport};
