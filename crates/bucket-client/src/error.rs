//! Client error types.

use thiserror::Error;

/// Errors reported by an [`ObjectClient`](crate::ObjectClient) implementation.
///
/// Only [`ClientError::NotFound`] and [`ClientError::PreconditionFailed`] carry meaning for
/// callers; everything else is transport or backend detail that is passed through unchanged.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested key does not exist.
    #[error("object {key:?} not found")]
    NotFound {
        /// The key that was requested.
        key: String,
    },

    /// A conditional request did not match the object's current validator.
    #[error("precondition failed for object {key:?}")]
    PreconditionFailed {
        /// The key that was requested.
        key: String,
    },

    /// The bucket does not exist.
    #[error("bucket {0:?} does not exist")]
    NoSuchBucket(String),

    /// The key cannot be represented by this backend.
    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    /// Local I/O failure inside the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    /// Shorthand for [`ClientError::NotFound`].
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Whether this error means the object is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error is a failed conditional request.
    #[must_use]
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}
