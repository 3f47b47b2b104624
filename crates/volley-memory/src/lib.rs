//! # volley-memory
//!
//! Aggregates contextual memory for a parsed lob: past resolutions ranked
//! by keyword relevance weighted by historical success, plus learned
//! routing suggestions per system.
//!
//! Naive keyword-count relevance lets noisy text dominate, so scores are
//! normalized by the size of the keyword set and re-ranked by success
//! count — the memory ranks "what actually worked", not just "what
//! matched".
//!
//! ## Fail-Soft
//!
//! A failed history lookup for one keyword or system is logged and
//! skipped; aggregation never fails the pipeline.

#![deny(unsafe_code)]

pub mod aggregator;
pub mod keywords;
pub mod store;

pub use aggregator::{
    MemoryAggregator, MemoryContext, MemoryPolicy, RankedResolution, RoutingSuggestion,
};
pub use keywords::{derive_keywords, derive_systems};
pub use store::HistoryStore;
