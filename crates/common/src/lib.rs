//! Common utilities shared across sessionward crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification
//! - `platform`: token types, JWT decoding, OAuth refresh/revocation client
//! - `test-utils`: mock implementations of the platform seams

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{
    OAuthClient, OAuthClientError, OAuthClientTrait, OAuthConfig, OAuthError, TokenResponse,
    TokenSet,
};
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity};
