//! Storage errors.

/// Errors from the SQLite store layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// SQL execution failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool exhausted or broken.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A referenced row does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Row kind (e.g. `"resolution record"`).
        kind: &'static str,
        /// Row identifier.
        id: String,
    },
}

impl StorageError {
    /// Construct a not-found error.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StorageError::not_found("resolution record", "rec-9");
        assert_eq!(err.to_string(), "resolution record not found: rec-9");
    }
}
