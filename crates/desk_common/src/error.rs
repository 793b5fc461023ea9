//! Error taxonomy for the desk service.
//!
//! Variants are grouped by effect rather than by source: the HTTP layer
//! maps them to status codes, the retry wrapper consults
//! `is_retryable`, and reconciliation treats `Inconsistency` as a
//! report line rather than a failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Network-class failure: timeout, connect error, 5xx upstream
    #[error("Backend temporarily unavailable: {0}")]
    Transient(String),

    /// Permanent storage or query failure
    #[error("Storage error: {0}")]
    Backend(String),

    /// External cross-reference missing (e.g. webhook for an unknown key)
    #[error("External data inconsistency: {0}")]
    Inconsistency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeskError {
    /// Only transient failures are worth retrying; everything else is a
    /// caller or data problem that a retry would repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(DeskError::Transient("timeout".into()).is_retryable());
        assert!(!DeskError::Backend("no such table".into()).is_retryable());
        assert!(!DeskError::Validation("bad sort".into()).is_retryable());
        assert!(!DeskError::Unauthorized.is_retryable());
        assert!(!DeskError::NotFound("ticket".into()).is_retryable());
    }
}
