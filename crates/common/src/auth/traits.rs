//! OAuth client trait for dependency injection and testing
//!
//! The token core only depends on this trait, so refresh and revocation can be
//! exercised against the `MockOAuthClient` from the `test-utils` feature or a
//! `wiremock`-backed [`super::OAuthClient`].

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenResponse;

/// Operations the token core needs from an identity provider
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Exchange a refresh token for new tokens (`grant_type=refresh_token`)
    ///
    /// # Errors
    /// Returns error on network failure, timeout, or a provider error payload.
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Revoke a refresh token at the provider
    ///
    /// # Errors
    /// Returns error if the revocation call fails; callers treat it as
    /// best-effort.
    async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError>;
}
