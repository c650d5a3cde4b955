/// Errors that can occur during subscriber store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested subscriber was not found.
    #[error("Subscriber not found: {id}")]
    NotFound {
        /// The subscriber id that was not found.
        id: String,
    },

    /// The stored record could not be interpreted.
    #[error("Invalid record for '{id}': {message}")]
    InvalidRecord { id: String, message: String },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `InvalidRecord` error.
    #[must_use]
    pub fn invalid_record(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("a@b.com");
        assert_eq!(err.to_string(), "Subscriber not found: a@b.com");

        let err = StoreError::connection("refused");
        assert_eq!(err.to_string(), "Connection error: refused");
    }

    #[test]
    fn test_error_predicates() {
        assert!(StoreError::not_found("x").is_not_found());
        assert!(!StoreError::internal("boom").is_not_found());
    }
}
