//! Error types used throughout sessionward

use thiserror::Error;

/// Main error type for sessionward
///
/// Expected flow-control outcomes (an expired token, a 401, a failed refresh)
/// are never represented here. They surface as `bool`/`Option`/outcome values
/// so callers are forced to handle them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionwardError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// An authenticated principal carried no claim usable as identity key.
    #[error("Configuration error: authenticated principal has no '{claim}' claim")]
    MissingIdentityClaim { claim: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionwardError {
    /// Whether this error stems from misconfiguration rather than runtime
    /// conditions.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::MissingIdentityClaim { .. })
    }
}

/// Result type alias for sessionward operations
pub type Result<T> = std::result::Result<T, SessionwardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_claim_is_a_configuration_error() {
        let err = SessionwardError::MissingIdentityClaim { claim: "sub".into() };

        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Configuration error: authenticated principal has no 'sub' claim"
        );
    }

    #[test]
    fn network_error_is_not_configuration() {
        assert!(!SessionwardError::Network("connection reset".into()).is_configuration());
    }
}
