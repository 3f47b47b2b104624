//! Pipeline error taxonomy.

use volley_parser::ParseError;

/// Errors from an enrichment call.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The lob was empty or whitespace-only.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// Parsing failed; the enrichment cannot proceed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The caller cancelled the enrichment. No partial result exists.
    #[error("enrichment cancelled")]
    Cancelled,
}
