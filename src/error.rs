//! # Error Types
//!
//! Unified error handling for the synchronization layer.
//!
//! The taxonomy separates caller mistakes ([`SyncError::Validation`]) from
//! session problems ([`SyncError::AuthenticationRequired`]) and store-side
//! failures ([`SyncError::Server`], [`SyncError::Http`]). Cache divergence
//! detected after a write is deliberately NOT represented here: it is
//! recorded as a [`crate::sync::ConsistencyWarning`] and never fails the
//! originating call.

use anyhow::Result;
use thiserror::Error;

/// Synchronization operation result type
pub type SyncResult<T> = Result<T, SyncError>;

/// Error types for synchronization and store operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("store error: HTTP {status} - {message}")]
    Server { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Classify a non-success store response by status code.
    ///
    /// 401 demands re-authentication, 400 and 422 are payload rejections,
    /// everything else is reported as a server-side failure.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => Self::AuthenticationRequired(message.into()),
            400 | 422 => Self::Validation(message.into()),
            _ => Self::Server {
                status,
                message: message.into(),
            },
        }
    }

    /// Check if error is recoverable (worth retrying)
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            SyncError::Http(e) => e.is_timeout() || e.is_connect(),
            SyncError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            SyncError::from_status(401, "token expired"),
            SyncError::AuthenticationRequired(_)
        ));
        assert!(matches!(
            SyncError::from_status(400, "bad payload"),
            SyncError::Validation(_)
        ));
        assert!(matches!(
            SyncError::from_status(422, "unprocessable"),
            SyncError::Validation(_)
        ));
        assert!(matches!(
            SyncError::from_status(500, "boom"),
            SyncError::Server { status: 500, .. }
        ));
        assert!(matches!(
            SyncError::from_status(503, "unavailable"),
            SyncError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn recoverability() {
        assert!(SyncError::from_status(500, "boom").is_recoverable());
        assert!(SyncError::from_status(503, "unavailable").is_recoverable());
        assert!(!SyncError::from_status(404, "missing").is_recoverable());
        assert!(!SyncError::from_status(401, "token expired").is_recoverable());
        assert!(!SyncError::validation("bad id").is_recoverable());
        assert!(!SyncError::config_error("bad url").is_recoverable());
    }

    #[test]
    fn display_formats() {
        let err = SyncError::from_status(500, "store exploded");
        assert_eq!(err.to_string(), "store error: HTTP 500 - store exploded");

        let err = SyncError::validation("legacy numeric id");
        assert_eq!(err.to_string(), "validation failed: legacy numeric id");
    }
}
