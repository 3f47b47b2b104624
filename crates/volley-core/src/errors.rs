//! Shared error types for external store collaborators.

/// Failure reported by a backing store (knowledge base or history).
///
/// Stores are external collaborators; the core only needs enough detail to
/// log the fault and decide between degrading and propagating.
#[derive(Clone, Debug, thiserror::Error)]
#[error("store error during {operation}: {message}")]
pub struct StoreError {
    /// Operation that failed (e.g. `"find_candidates"`).
    pub operation: String,
    /// Human-readable message.
    pub message: String,
}

impl StoreError {
    /// Create a new store error.
    #[must_use]
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
