//! Parser error taxonomy.

use volley_llm::ProviderError;

/// Errors from a parse call.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Input text was empty or whitespace-only; rejected before any
    /// external call.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// The completion collaborator failed. Propagated as-is — retry and
    /// backoff policy belong to the caller.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The completion returned content that is not JSON even after the
    /// repair attempt.
    #[error("malformed model output: {message}")]
    MalformedOutput {
        /// Parse failure description.
        message: String,
    },
}

impl ParseError {
    /// Convenience constructor for invalid-input failures.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
