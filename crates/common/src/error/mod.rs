//! Error classification shared by every sessionward error type
//!
//! Module-specific errors stay module-specific (`OAuthClientError`,
//! `DispatchError`, ...). What they share is this classification interface,
//! which lets logging and retry decisions treat them uniformly:
//!
//! - **`is_retryable()`**: would the same call plausibly succeed later?
//! - **`severity()`**: how loudly should it be reported?
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | No refresh token stored |
//! | **Warning** | Degraded but recoverable | Provider rejected a refresh grant, timeouts |
//! | **Error** | Failure requiring attention | Malformed provider responses, bad configuration |
//! | **Critical** | Integrity at risk | Internal invariant violations |
//!
//! ```rust,ignore
//! use sessionward_common::error::{ErrorClassification, ErrorSeverity};
//!
//! fn report<E: ErrorClassification + std::fmt::Display>(err: &E) {
//!     match err.severity() {
//!         ErrorSeverity::Info => tracing::debug!(error = %err, "recoverable"),
//!         ErrorSeverity::Warning => tracing::warn!(error = %err, "degraded"),
//!         _ => tracing::error!(error = %err, "failed"),
//!     }
//! }
//! ```

use std::fmt;

/// Standard classification interface for error types
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: network timeouts, connection resets,
    /// provider-side 5xx responses.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
