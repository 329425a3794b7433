//! Error types for the doccache store.

use thiserror::Error;

/// Failure reported by a document collection backend.
///
/// Backends surface their own error types; the store keeps them boxed so the
/// original cause stays reachable through [`std::error::Error::source`].
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when building or using a [`TtlStore`](crate::TtlStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Missing or malformed collection information at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The document collection failed to serve a request
    #[error("Backend error: {0}")]
    Backend(#[source] BackendError),

    /// The key passed to an operation is not usable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A typed value could not be converted to JSON
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A stored JSON value does not match the requested type
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl StoreError {
    /// Returns `true` if this error was raised while constructing a store.
    pub fn is_configuration(&self) -> bool {
        matches!(self, StoreError::Configuration(_))
    }

    /// Returns `true` if this error came from the document collection.
    pub fn is_backend(&self) -> bool {
        matches!(self, StoreError::Backend(_))
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        StoreError::Configuration(message.into())
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        StoreError::Backend(err)
    }
}
