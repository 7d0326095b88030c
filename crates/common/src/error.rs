//! Common error types shared across crates.

use thiserror::Error;

/// Top-level error taxonomy for encrypted persistence.
///
/// Variants group lower-level failures by how the caller must react:
/// - [`ServiceError::Configuration`] is fatal and only raised at start-up.
/// - [`ServiceError::Decryption`] and [`ServiceError::Deserialization`] fail the
///   single read that produced them. They are never transient, so callers must
///   not retry.
/// - [`ServiceError::Serialization`] fails the write that produced it.
/// - [`ServiceError::Storage`] comes from the storage engine behind a backend.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The secret or another required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A stored blob could not be decrypted (malformed, truncated or wrong key).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A decrypted string did not parse into the field's value shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A value could not be turned into its stored string form.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The storage engine rejected or failed an operation.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Returns `true` for errors that must stop the process from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Configuration(_))
    }

    /// Short machine-readable code, safe to put in logs and responses.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Configuration(_) => "configuration",
            ServiceError::Decryption(_) => "decryption",
            ServiceError::Deserialization(_) => "deserialization",
            ServiceError::Serialization(_) => "serialization",
            ServiceError::Storage(_) => "storage",
        }
    }

    /// Generic message for end users.
    ///
    /// Never includes cryptographic detail or the offending stored value.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServiceError::Configuration(_) => "the service is not configured correctly",
            ServiceError::Decryption(_) | ServiceError::Deserialization(_) => {
                "stored data could not be read"
            }
            ServiceError::Serialization(_) => "data could not be stored",
            ServiceError::Storage(_) => "the storage backend is unavailable",
        }
    }
}
