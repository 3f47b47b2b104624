//! # volley-resolve
//!
//! Resolves extracted entity mentions against a backing knowledge store.
//!
//! The crux is the three-way branch per entity: auto-resolve (clear winner),
//! resolve-with-alternates (clear winner, non-trivial runners-up surfaced
//! for audit/undo), or ambiguous (candidates plus a clarification question).
//! The branch trades false-positive auto-resolution — silently assigning the
//! wrong person — against over-asking. Thresholds are policy, not invariants:
//! see [`ResolverPolicy`].

#![deny(unsafe_code)]

pub mod fuzzy;
pub mod question;
pub mod resolver;
pub mod store;

pub use fuzzy::FuzzyMatcher;
pub use resolver::{EntityResolver, ResolutionReport, ResolveError, ResolverPolicy};
pub use store::{EntityStore, NewEntity};
