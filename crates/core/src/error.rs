//! Error types shared by the collection store and its storage backends.

use thiserror::Error;

/// Failures surfaced by [`CollectionStore`](crate::store::CollectionStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input to `add`/`update` was rejected before anything was written.
    #[error("invalid game record: {0}")]
    Validation(String),

    /// The targeted record does not exist.
    #[error("no game with id {0}")]
    NotFound(String),

    /// The storage backend failed to read or write the collection.
    #[error("storage backend failure: {0}")]
    Persistence(#[from] BackendError),

    /// The stored collection could not be encoded or decoded.
    #[error("failed to encode or decode collection: {0}")]
    Codec(#[from] serde_json::Error),
}

impl StoreError {
    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(self, StoreError::Validation(_) | StoreError::NotFound(_))
    }
}

/// Failures reported by a [`StorageBackend`](crate::store::StorageBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    /// Underlying filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_distinguished_from_backend_failures() {
        assert!(StoreError::Validation("title".into()).is_user_error());
        assert!(StoreError::NotFound("42".into()).is_user_error());
        let backend = StoreError::from(BackendError::Unavailable("offline".into()));
        assert!(!backend.is_user_error());
        assert_eq!(
            backend.to_string(),
            "storage backend failure: backend unavailable: offline"
        );
    }
}
