//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Caller-supplied input was rejected (empty text, malformed color, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Object not found in scene.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The operation is not valid for the object or current state.
    #[error("Invalid operation on object: {0}")]
    InvalidOperation(String),

    /// Snapshot or payload serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
