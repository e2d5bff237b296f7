//! OAuth 2.0 client for the refresh-token grant and token revocation
//!
//! Talks to the provider's token endpoint (RFC 6749 §6) and revocation
//! endpoint (RFC 7009). Every request carries the client credentials as form
//! parameters; token material is never logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse};
use crate::error::{ErrorClassification, ErrorSeverity};

/// Request timeout applied when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug, thiserror::Error)]
pub enum OAuthClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// Provider did not answer within the request timeout
    #[error("request to identity provider timed out")]
    Timeout,

    /// OAuth server returned an error payload
    #[error("OAuth error: {0}")]
    OAuthError(OAuthError),

    /// Non-success status without a parseable error payload
    #[error("identity provider returned HTTP {status}")]
    UnexpectedStatus { status: u16 },

    /// Failed to parse response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No refresh token available
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(err)
        }
    }
}

impl ErrorClassification for OAuthClientError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::Timeout => true,
            Self::OAuthError(error) => error.is_transient(),
            Self::UnexpectedStatus { status } => *status >= 500 || *status == 429,
            Self::ParseError(_) | Self::NoRefreshToken | Self::ConfigError(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoRefreshToken => ErrorSeverity::Info,
            Self::RequestFailed(_)
            | Self::Timeout
            | Self::OAuthError(_)
            | Self::UnexpectedStatus { .. } => ErrorSeverity::Warning,
            Self::ParseError(_) | Self::ConfigError(_) => ErrorSeverity::Error,
        }
    }
}

/// OAuth 2.0 client bound to one provider registration
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a client with the default 30s request timeout
    ///
    /// # Errors
    /// Returns `ConfigError` if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthClientError> {
        Self::with_timeout(config, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client whose requests are bounded by `timeout`
    ///
    /// # Errors
    /// Returns `ConfigError` if the HTTP client cannot be built.
    pub fn with_timeout(config: OAuthConfig, timeout: Duration) -> Result<Self, OAuthClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OAuthClientError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub const fn config(&self) -> &OAuthConfig {
        &self.config
    }

    fn credential_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("client_id", self.config.client_id.clone())];
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.clone()));
        }
        params
    }

    /// Exchange a refresh token for a new token response
    ///
    /// # Errors
    /// Returns error if:
    /// - The refresh token is empty
    /// - The request fails or times out
    /// - The provider answers with an error payload or unexpected status
    /// - The success body cannot be parsed
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let mut params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
        ];
        params.extend(self.credential_params());

        debug!(endpoint = %self.config.token_url, "sending refresh-token grant");
        let response = self.client.post(&self.config.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            if e.is_timeout() {
                OAuthClientError::Timeout
            } else {
                OAuthClientError::ParseError(e.to_string())
            }
        })
    }

    /// Revoke a refresh token (RFC 7009)
    ///
    /// # Errors
    /// Returns error if the request fails or the provider rejects it.
    pub async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError> {
        if token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let mut params =
            vec![("token", token.to_string()), ("token_type_hint", "refresh_token".to_string())];
        params.extend(self.credential_params());

        let endpoint = self.config.revocation_endpoint();
        debug!(endpoint = %endpoint, "sending token revocation");
        let response = self.client.post(endpoint).form(&params).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}

async fn error_from_response(response: Response) -> OAuthClientError {
    let status = response.status().as_u16();
    match response.json::<OAuthError>().await {
        Ok(error) => {
            warn!(status, error = %error.error, "identity provider returned an error");
            OAuthClientError::OAuthError(error)
        }
        Err(_) => {
            warn!(status, "identity provider returned a non-success status");
            OAuthClientError::UnexpectedStatus { status }
        }
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }

    async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError> {
        self.revoke_token(token).await
    }
}
