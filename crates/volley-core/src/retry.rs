//! Retry configuration and backoff calculation.
//!
//! Portable, sync-only building blocks: the async retry execution lives in
//! `volley-llm` (which has access to tokio). The pipeline itself never
//! retries the completion call — retry policy belongs to the caller of the
//! parser, and these are the pieces that caller assembles.

use serde::{Deserialize, Serialize};

/// Default maximum retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Configuration for retry logic.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between retries in ms (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.2).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

/// Exponential backoff delay for a retry attempt, with jitter.
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (random*2-1) * jitter)`.
/// `random` must come from a PRNG in `[0.0, 1.0)`; 0.5 yields the exact
/// exponential value, so tests can pin it.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn backoff_delay_ms(attempt: u32, config: &RetryConfig, random: f64) -> u64 {
    let exponential = config
        .base_delay_ms
        .saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(config.max_delay_ms);

    // Maps random [0,1) to a [-jitter, +jitter] multiplier
    let jitter = 1.0 + (random * 2.0 - 1.0) * config.jitter_factor;
    ((capped as f64) * jitter).round().max(0.0) as u64
}

/// Parse a `Retry-After` HTTP header value into milliseconds.
///
/// Accepts either integer seconds (`"120"`) or an HTTP-date
/// (`"Thu, 01 Dec 2025 16:00:00 GMT"`). Past dates clamp to 0.
#[must_use]
pub fn parse_retry_after_ms(value: &str) -> Option<u64> {
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds * 1000);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let delay_ms = date
            .signed_duration_since(chrono::Utc::now())
            .num_milliseconds();
        #[allow(clippy::cast_sign_loss)]
        return Some(if delay_ms > 0 { delay_ms as u64 } else { 0 });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30_000);
        assert!((config.jitter_factor - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn config_serde_fills_defaults() {
        let config: RetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_retries, 3);
        let config: RetryConfig = serde_json::from_str(r#"{"maxRetries": 7}"#).unwrap();
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.base_delay_ms, 1000);
    }

    #[test]
    fn backoff_exponential_growth() {
        let config = RetryConfig {
            jitter_factor: 0.0,
            ..RetryConfig::default()
        };
        assert_eq!(backoff_delay_ms(0, &config, 0.5), 1000);
        assert_eq!(backoff_delay_ms(1, &config, 0.5), 2000);
        assert_eq!(backoff_delay_ms(2, &config, 0.5), 4000);
        assert_eq!(backoff_delay_ms(3, &config, 0.5), 8000);
    }

    #[test]
    fn backoff_caps_at_max() {
        let config = RetryConfig {
            jitter_factor: 0.0,
            ..RetryConfig::default()
        };
        assert_eq!(backoff_delay_ms(10, &config, 0.5), 30_000);
    }

    #[test]
    fn backoff_jitter_range() {
        let config = RetryConfig::default();
        // random = 0.0 → -20%, random = 1.0 → +20%
        assert_eq!(backoff_delay_ms(0, &config, 0.0), 800);
        assert_eq!(backoff_delay_ms(0, &config, 0.5), 1000);
        assert_eq!(backoff_delay_ms(0, &config, 1.0), 1200);
    }

    #[test]
    fn backoff_high_attempt_no_overflow() {
        let config = RetryConfig::default();
        let delay = backoff_delay_ms(100, &config, 1.0);
        assert!(delay > 0);
        assert!(delay <= 36_000); // 30_000 * 1.2
    }

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after_ms("120"), Some(120_000));
        assert_eq!(parse_retry_after_ms("0"), Some(0));
    }

    #[test]
    fn retry_after_invalid() {
        assert_eq!(parse_retry_after_ms("not-a-number"), None);
        assert_eq!(parse_retry_after_ms(""), None);
    }

    #[test]
    fn retry_after_http_dates() {
        use chrono::{TimeZone, Utc};
        let future = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap().to_rfc2822();
        assert!(parse_retry_after_ms(&future).unwrap() > 0);

        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().to_rfc2822();
        assert_eq!(parse_retry_after_ms(&past), Some(0));
    }
}
