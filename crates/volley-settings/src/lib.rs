//! # volley-settings
//!
//! Typed settings with layered loading: compiled defaults, deep-merged
//! JSON file, then environment overrides. Every numeric policy constant in
//! the enrichment core (resolution thresholds, memory weights, token
//! budgets, retry parameters) lives here — they are tunable configuration,
//! not hard-coded invariants.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{
    ProviderSettings, RoutingEvolutionSettings, SegmenterSettings, StoreSettings, VolleySettings,
};
