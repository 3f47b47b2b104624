//! The completion-service trait.
//!
//! Providers take a system prompt plus user text and return a raw string
//! that *should* be JSON — the parser treats it as untrusted input either
//! way. Implementors must be `Send + Sync` for use across async tasks.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Options for a completion request.
///
/// All fields optional — providers fall back to deterministic-leaning
/// defaults (low temperature, JSON mode) when unset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    /// Sampling temperature (0.0–2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    /// Deterministic-leaning options sized for a segmentation call:
    /// low temperature, output budget for roughly 15 tasks with entities.
    #[must_use]
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            temperature: Some(0.1),
            max_tokens: Some(max_tokens),
        }
    }
}

/// Black-box completion collaborator.
///
/// The returned string is whatever the model produced; callers own
/// validation and repair. Implementations must not retry internally —
/// retry policy belongs to the caller (see [`crate::with_completion_retry`]).
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Request a JSON-mode completion.
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_text: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError>;
}

#[async_trait]
impl<T: CompletionService> CompletionService for Arc<T> {
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_text: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        (**self).complete_json(system_prompt, user_text, options).await
    }
}
