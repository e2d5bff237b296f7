//! OAuth 2.0 / OIDC token plumbing
//!
//! Everything the token core needs to talk to an identity provider, and
//! nothing it does not: there is no authorization-code flow here, only the
//! refresh-token grant and token revocation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ OAuthClientTrait │  Seam consumed by the refresher (mockable)
//! └────────┬─────────┘
//!          │
//!          └──► OAuthClient   (reqwest: refresh grant + RFC 7009 revocation)
//!                   │
//!                   └──► TokenResponse ──► TokenSet (jwt::decode_expiry fallback)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenSet`, `TokenResponse`, `OAuthConfig`, `OAuthError`
//! - **[`jwt`]**: unverified `exp` claim decoding for id tokens
//! - **[`client`]**: the HTTP client for the provider's token endpoints
//! - **[`traits`]**: the `OAuthClientTrait` seam

pub mod client;
pub mod jwt;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use client::{OAuthClient, OAuthClientError};
pub use jwt::decode_expiry;
pub use traits::OAuthClientTrait;
pub use types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};
