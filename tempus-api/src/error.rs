use std::time::Duration;

use thiserror::Error;

/// The four failure classes every store handles the same way: caught,
/// turned into a message, and abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network or timeout failure before a response arrived
    Transport,
    /// A body that is not a valid envelope
    Malformed,
    /// Rejected on the client before sending
    Validation,
    /// `Success: false` from the backend
    Business,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response (status {status}): {reason}")]
    MalformedResponse { status: u16, reason: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Response from {endpoint} carried no data")]
    MissingData { endpoint: String },

    #[error("No auth token available")]
    MissingToken,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn rejected(status: u16, message: String) -> Self {
        let message = if message.trim().is_empty() {
            format!("Request rejected with status {status}")
        } else {
            message
        };
        Self::Rejected { status, message }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Transport(_) | Self::Timeout(_) => ErrorClass::Transport,
            Self::MalformedResponse { .. } | Self::MissingData { .. } => ErrorClass::Malformed,
            Self::Validation(_) | Self::MissingToken | Self::Config(_) => ErrorClass::Validation,
            Self::Rejected { .. } => ErrorClass::Business,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(
            ApiError::Transport("down".into()).class(),
            ErrorClass::Transport
        );
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(1)).class(),
            ErrorClass::Transport
        );
        let malformed = ApiError::MalformedResponse {
            status: 200,
            reason: "eof".into(),
        };
        assert_eq!(malformed.class(), ErrorClass::Malformed);
        assert_eq!(
            ApiError::Validation("empty".into()).class(),
            ErrorClass::Validation
        );
        assert_eq!(
            ApiError::rejected(500, "boom".into()).class(),
            ErrorClass::Business
        );
    }

    #[test]
    fn test_rejected_falls_back_to_status_message() {
        let err = ApiError::rejected(403, "  ".into());
        assert_eq!(err.to_string(), "Request rejected with status 403");

        let err = ApiError::rejected(400, "Invalid request body".into());
        assert_eq!(err.to_string(), "Invalid request body");
    }
}
