//! OpenAI-compatible HTTP completion provider.
//!
//! Speaks the `/chat/completions` wire shape in JSON-response mode, which
//! most hosted and self-hosted providers expose. The base URL and model
//! come from configuration, keeping the core vendor-agnostic.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use volley_core::retry::parse_retry_after_ms;

use crate::error::ProviderError;
use crate::service::{CompletionOptions, CompletionService};

/// Default sampling temperature when the caller sets none.
const DEFAULT_TEMPERATURE: f64 = 0.1;
/// Fallback retry delay when a 429 carries no usable Retry-After header.
const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1000;

/// Configuration for [`HttpCompletionService`].
#[derive(Clone, Debug)]
pub struct HttpProviderConfig {
    /// Endpoint base, e.g. `https://api.example.com/v1`.
    pub base_url: String,
    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Model identifier to request.
    pub model: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Completion service backed by an OpenAI-compatible HTTP endpoint.
pub struct HttpCompletionService {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpCompletionService {
    /// Build a service with a dedicated client honoring the configured timeout.
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

// Response envelope — only the fields we read.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait::async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_text: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_text},
            ],
            "temperature": options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "response_format": {"type": "json_object"},
        });
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after_ms);
            let message = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::Auth { message }
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
                    retry_after_ms: retry_after.unwrap_or(DEFAULT_RATE_LIMIT_DELAY_MS),
                    message,
                },
                s if s.is_server_error() => ProviderError::Api {
                    status: s.as_u16(),
                    message,
                    retryable: true,
                },
                s => ProviderError::Api {
                    status: s.as_u16(),
                    message,
                    retryable: false,
                },
            });
        }

        let envelope: ChatResponse = serde_json::from_str(&response.text().await?)?;
        let choice = envelope.choices.into_iter().next().ok_or_else(|| {
            ProviderError::Empty {
                message: "response contained no choices".into(),
            }
        })?;

        if choice.finish_reason.as_deref() == Some("length") {
            // Truncated output still goes to the validator — its brace
            // matching salvages complete objects when it can.
            warn!(model = %self.config.model, "completion hit the max_tokens budget");
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => {
                debug!(bytes = content.len(), "completion received");
                Ok(content)
            }
            _ => Err(ProviderError::Empty {
                message: "choice carried no content".into(),
            }),
        }
    }
}
