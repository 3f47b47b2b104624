//! Settings loading with deep merge and environment overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`VolleySettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::VolleySettings;

/// Resolve the settings file path: `$VOLLEY_SETTINGS` if set, else
/// `~/.volley/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("VOLLEY_SETTINGS") {
        if !explicit.is_empty() {
            return PathBuf::from(explicit);
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".volley").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<VolleySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<VolleySettings> {
    let defaults = serde_json::to_value(VolleySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: VolleySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Numeric values are range-checked; invalid values are ignored with a
/// warning, falling back to file/default.
pub fn apply_env_overrides(settings: &mut VolleySettings) {
    if let Some(v) = read_env_string("VOLLEY_PROVIDER_URL") {
        settings.provider.base_url = v;
    }
    if let Some(v) = read_env_string("VOLLEY_PROVIDER_KEY") {
        settings.provider.api_key = Some(v);
    }
    if let Some(v) = read_env_string("VOLLEY_MODEL") {
        settings.provider.model = v;
    }
    if let Some(v) = read_env_u64("VOLLEY_PROVIDER_TIMEOUT_MS", 1000, 600_000) {
        settings.provider.timeout_ms = v;
    }
    if let Some(v) = read_env_u32("VOLLEY_MAX_OUTPUT_TOKENS", 256, 128_000) {
        settings.segmenter.max_output_tokens = v;
    }
    if let Some(v) = read_env_string("VOLLEY_DB_PATH") {
        settings.store.db_path = v;
    }
    if let Some(v) = read_env_u32("VOLLEY_MAX_RETRIES", 0, 20) {
        settings.retry.max_retries = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
