//! Caller-side retry wrapper for completion calls.
//!
//! Wraps a completion factory with exponential backoff. Only retryable
//! errors are retried; a provider-suggested `Retry-After` wins over the
//! computed backoff when it is larger. Cancellation is checked before
//! every wait and before every attempt.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use volley_core::retry::{backoff_delay_ms, RetryConfig};

use crate::error::ProviderError;

/// Run a completion factory with retry.
///
/// `factory` is called once per attempt and must produce a fresh future
/// (completion calls are not idempotent, so each attempt is a new request).
///
/// Returns the first success, or the last error once `max_retries` is
/// exhausted or a non-retryable error occurs.
pub async fn with_completion_retry<F, Fut>(
    factory: F,
    config: &RetryConfig,
    cancel: Option<&CancellationToken>,
) -> Result<String, ProviderError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String, ProviderError>>,
{
    let mut attempt = 0u32;

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(ProviderError::Cancelled);
        }

        match factory().await {
            Ok(output) => return Ok(output),
            Err(err) => {
                if !err.is_retryable() || attempt >= config.max_retries {
                    return Err(err);
                }

                attempt += 1;
                let computed = backoff_delay_ms(attempt, config, rand::random::<f64>());
                let delay_ms = err.retry_after_ms().map_or(computed, |suggested| {
                    suggested.max(computed)
                });

                warn!(
                    attempt,
                    delay_ms,
                    category = err.category(),
                    error = %err,
                    "completion attempt failed, backing off"
                );

                let sleep = tokio::time::sleep(std::time::Duration::from_millis(delay_ms));
                if let Some(token) = cancel {
                    tokio::select! {
                        () = token.cancelled() => return Err(ProviderError::Cancelled),
                        () = sleep => {}
                    }
                } else {
                    sleep.await;
                }
                debug!(attempt, "retrying completion");
            }
        }
    }
}
