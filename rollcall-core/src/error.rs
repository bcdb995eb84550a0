use thiserror::Error;

/// Failure taxonomy for roster operations.
///
/// `NotFound`, `Conflict`, and `Validation` are terminal business outcomes
/// surfaced directly to the caller; they are never retried. Only `Internal`
/// (store or connectivity failure) is a candidate for caller-side retry.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
