//! Errors raised by outbound dispatch, and their mapping into domain errors.

use sessionward_common::{ErrorClassification, ErrorSeverity};
use sessionward_domain::SessionwardError;

/// Failure to obtain any HTTP response
///
/// A 401 (or any other status) is a response, not an error: it is returned to
/// the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Connection, TLS or protocol failure
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// No response within the dispatch timeout
    #[error("HTTP request timed out")]
    Timeout,

    /// The bearer token cannot be encoded as a header value
    #[error("invalid Authorization header: {0}")]
    InvalidHeader(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

impl ErrorClassification for DispatchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_connect() || err.is_request(),
            Self::Timeout => true,
            Self::InvalidHeader(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transport(_) | Self::Timeout => ErrorSeverity::Warning,
            Self::InvalidHeader(_) => ErrorSeverity::Error,
        }
    }
}

impl From<DispatchError> for SessionwardError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Transport(err) => Self::Network(err.to_string()),
            DispatchError::Timeout => Self::Network("request timed out".into()),
            DispatchError::InvalidHeader(message) => Self::Protocol(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_network_error() {
        let err: SessionwardError = DispatchError::Timeout.into();
        assert_eq!(err, SessionwardError::Network("request timed out".into()));
    }

    #[test]
    fn invalid_header_is_not_retryable() {
        let err = DispatchError::InvalidHeader("control character".into());

        assert!(!err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(matches!(SessionwardError::from(err), SessionwardError::Protocol(_)));
    }
}
