//! Error types for permtree

use thiserror::Error;

/// The main error type for permtree operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermtreeError {
    /// An id referenced by a path, tree or resolver operation does not resolve
    #[error("{collection} '{id}' not found")]
    NotFound { collection: String, id: String },

    /// A parent-chain walk revisited an id
    #[error("cycle detected at '{id}'")]
    CycleDetected { id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reported by the backing document store
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),
}

impl PermtreeError {
    pub fn not_found(collection: &str, id: impl ToString) -> Self {
        PermtreeError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn cycle(id: impl ToString) -> Self {
        PermtreeError::CycleDetected { id: id.to_string() }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        PermtreeError::InvalidArgument(msg.into())
    }
}

impl From<serde_json::Error> for PermtreeError {
    fn from(e: serde_json::Error) -> Self {
        PermtreeError::Serialization(e.to_string())
    }
}

/// Result type alias for permtree operations
pub type Result<T> = std::result::Result<T, PermtreeError>;

/// Convert any storage-side error to PermtreeError
pub fn err<E: std::error::Error>(e: E) -> PermtreeError {
    PermtreeError::Storage(e.to_string())
}
