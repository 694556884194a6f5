//! Error taxonomy for the resolution core.
//!
//! Store adapters and binaries work with `anyhow`; the public operations map
//! their failures onto these three kinds so callers can tell a bad request
//! from a missing record from a broken backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The request itself is malformed. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A master record or duplicate group does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unexpected persistence failure.
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ResolutionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Only backend failures are worth retrying; bad requests and missing
    /// records will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_kinds_and_messages() {
        let err = ResolutionError::validation("string1 is empty");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "validation failed: string1 is empty");

        let err = ResolutionError::not_found("master record 7");
        assert!(err.is_not_found());

        let err: ResolutionError = anyhow!("connection reset").context("update failed").into();
        assert!(!err.is_validation() && !err.is_not_found());
        assert!(err.is_retryable());
        assert!(!ResolutionError::validation("x").is_retryable());
        assert_eq!(err.to_string(), "internal error: update failed: connection reset");
    }
}
