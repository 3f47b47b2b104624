//! Settings errors.

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors from loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read.
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File contained invalid JSON or a shape mismatch.
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
