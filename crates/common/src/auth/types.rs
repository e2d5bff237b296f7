//! OAuth 2.0 types and structures
//!
//! Token material held for a session, the wire formats of the token endpoint,
//! and the client configuration used to reach it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::jwt;

/// The tokens held for one authenticated identity
///
/// A `TokenSet` is a value: it is replaced wholesale, never edited in place.
/// `expires_at` is `None` when neither the provider nor the id token declared
/// a lifetime, in which case the set is only ever refreshed reactively.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// OIDC id token (JWT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Access token for resource servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Refresh token; absent when the provider did not issue one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiration timestamp (UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Create a token set from its parts
    #[must_use]
    pub const fn new(
        id_token: Option<String>,
        access_token: Option<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self { id_token, access_token, refresh_token, expires_at }
    }

    /// The explicit empty set (distinct from "no entry")
    #[must_use]
    pub const fn empty() -> Self {
        Self { id_token: None, access_token: None, refresh_token: None, expires_at: None }
    }

    /// True when the set carries no token at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id_token.is_none()
            && self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.expires_at.is_none()
    }

    /// True when the set holds something presentable as a bearer credential
    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.access_token.is_some() || self.id_token.is_some()
    }

    /// Seconds until expiry relative to `now`
    ///
    /// # Returns
    /// `Some(seconds)` (negative once expired) if expiry is known, `None`
    /// otherwise
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - now).num_seconds())
    }

    /// Fill a missing expiry from the id token's `exp` claim
    #[must_use]
    pub fn with_id_token_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self.id_token.as_deref().and_then(jwt::decode_expiry);
        }
        self
    }

    /// Build the successor of `previous` from a refresh-grant response
    ///
    /// The refresh token is carried over when the provider did not rotate it.
    /// Expiry comes from `expires_in` relative to `now`, falling back to the
    /// new id token's `exp` claim. A lifetime too large to represent counts as
    /// not declared.
    #[must_use]
    pub fn from_refresh(previous: &Self, response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_at = response
            .expires_in
            .filter(|seconds| *seconds > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));

        Self {
            id_token: response.id_token,
            access_token: Some(response.access_token),
            refresh_token: response.refresh_token.or_else(|| previous.refresh_token.clone()),
            expires_at,
        }
        .with_id_token_expiry()
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("id_token", &redact(self.id_token.as_ref()))
            .field("access_token", &redact(self.access_token.as_ref()))
            .field("refresh_token", &redact(self.refresh_token.as_ref()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

const fn redact(value: Option<&String>) -> Option<&'static str> {
    match value {
        Some(_) => Some("<redacted>"),
        None => None,
    }
}

/// Successful token endpoint response (RFC 6749 §5.1)
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Declared access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// A response carrying only an access token and lifetime
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_in: Option<i64>) -> Self {
        Self {
            access_token: access_token.into(),
            id_token: None,
            refresh_token: None,
            token_type: Some("Bearer".to_string()),
            expires_in,
            scope: None,
        }
    }

    /// Attach a rotated refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Attach an id token
    #[must_use]
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("id_token", &redact(self.id_token.as_ref()))
            .field("refresh_token", &redact(self.refresh_token.as_ref()))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Client registration and endpoints at the identity provider
#[derive(Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,

    /// Client secret for confidential clients
    pub client_secret: Option<String>,

    /// Token endpoint (refresh grant)
    pub token_url: String,

    /// RFC 7009 revocation endpoint; the token endpoint is used when unset
    pub revocation_url: Option<String>,
}

impl OAuthConfig {
    /// Create a new OAuth configuration
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        token_url: impl Into<String>,
        revocation_url: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            token_url: token_url.into(),
            revocation_url,
        }
    }

    /// Endpoint used for revocation calls
    #[must_use]
    pub fn revocation_endpoint(&self) -> &str {
        self.revocation_url.as_deref().unwrap_or(&self.token_url)
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(self.client_secret.as_ref()))
            .field("token_url", &self.token_url)
            .field("revocation_url", &self.revocation_url)
            .finish()
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl OAuthError {
    /// Provider-side conditions that may clear up on their own
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.error.as_str(), "temporarily_unavailable" | "server_error")
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
