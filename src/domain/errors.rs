use thiserror::Error;

/// Failure taxonomy of the service layer.
///
/// Per-item rejections inside a batch are *not* errors; they are captured in
/// a [`crate::domain::batch::BatchOutcome`]. A `DomainError` always aborts
/// the whole call.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Malformed input, an empty batch, or an illegal state transition.
    #[error("{0}")]
    BadRequest(String),
    /// A write that should have succeeded did not, distinct from `NotFound`
    /// so callers can tell "never existed" from "failed to save".
    #[error("{0}")]
    Failure(String),
    /// Raised by the identity collaborator and propagated through the core.
    #[error("{0}")]
    AccessDenied(String),
    /// Unexpected infrastructure error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        DomainError::BadRequest(msg.into())
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        DomainError::Failure(msg.into())
    }
}
