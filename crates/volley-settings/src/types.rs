//! Settings types with compiled defaults.
//!
//! All serializable types use `camelCase` for wire compatibility with the
//! settings file. Missing fields fall back to defaults field-by-field, so a
//! partial settings file is always valid.

use serde::{Deserialize, Serialize};
use volley_core::retry::RetryConfig;
use volley_memory::MemoryPolicy;
use volley_resolve::ResolverPolicy;

/// Completion-provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// OpenAI-compatible endpoint base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token, if the endpoint requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier to request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Segmentation-call settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmenterSettings {
    /// Output-token budget for one segmentation call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_max_output_tokens() -> u32 {
    4096
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Persistent-store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "volley.db".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Steps by which routing-pattern confidence evolves.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingEvolutionSettings {
    /// Confidence increase on an explicit confirmation (capped at 1.0).
    #[serde(default = "default_confirm_step")]
    pub confirm_step: f64,
    /// Confidence decrease on a conflicting assignment (floored at 0.0).
    #[serde(default = "default_conflict_step")]
    pub conflict_step: f64,
}

fn default_confirm_step() -> f64 {
    0.1
}
fn default_conflict_step() -> f64 {
    0.1
}

impl Default for RoutingEvolutionSettings {
    fn default() -> Self {
        Self {
            confirm_step: default_confirm_step(),
            conflict_step: default_conflict_step(),
        }
    }
}

/// Root settings for the Volley enrichment core.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolleySettings {
    /// Completion provider.
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Segmentation call.
    #[serde(default)]
    pub segmenter: SegmenterSettings,
    /// Entity-resolution policy (thresholds, caps, seeds).
    #[serde(default)]
    pub resolver: ResolverPolicy,
    /// Memory-aggregation policy (keyword caps, success weighting).
    #[serde(default)]
    pub memory: MemoryPolicy,
    /// Retry/backoff parameters for the completion caller.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Persistent store.
    #[serde(default)]
    pub store: StoreSettings,
    /// Routing-confidence evolution steps.
    #[serde(default)]
    pub routing: RoutingEvolutionSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let settings = VolleySettings::default();
        assert_eq!(settings.provider.timeout_ms, 30_000);
        assert_eq!(settings.segmenter.max_output_tokens, 4096);
        assert!((settings.resolver.auto_resolve_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(settings.memory.max_keywords, 5);
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.store.db_path, "volley.db");
        assert!((settings.routing.confirm_step - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let settings: VolleySettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.provider.model, "gpt-4o-mini");
        assert!((settings.resolver.runner_up_ceiling - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_section_keeps_sibling_defaults() {
        let settings: VolleySettings =
            serde_json::from_str(r#"{"resolver": {"autoResolveThreshold": 0.85}}"#).unwrap();
        assert!((settings.resolver.auto_resolve_threshold - 0.85).abs() < f64::EPSILON);
        assert!((settings.resolver.runner_up_ceiling - 0.7).abs() < f64::EPSILON);
        assert_eq!(settings.memory.max_resolutions, 5);
    }

    #[test]
    fn serde_roundtrip() {
        let settings = VolleySettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("baseUrl"));
        assert!(json.contains("maxOutputTokens"));
        let back: VolleySettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.provider.base_url, settings.provider.base_url);
    }
}
