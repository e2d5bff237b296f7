//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLOCK_SKEW_MINUTES, DEFAULT_DISPATCH_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_USER_IDENTIFIER_CLAIM, MAX_CLOCK_SKEW_MINUTES,
};
use crate::errors::{Result, SessionwardError};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionwardConfig {
    pub auth: AuthSettings,
    pub oauth: OAuthSettings,
    pub http: HttpSettings,
    pub logging: LoggingConfig,
}

impl SessionwardConfig {
    /// Reject configurations the core cannot run with.
    ///
    /// # Errors
    /// Returns `SessionwardError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(SessionwardError::Config("oauth.client_id must not be empty".into()));
        }
        if self.oauth.token_url.trim().is_empty() {
            return Err(SessionwardError::Config("oauth.token_url must not be empty".into()));
        }
        if self.auth.user_identifier_claim_name.trim().is_empty() {
            return Err(SessionwardError::Config(
                "auth.user_identifier_claim_name must not be empty".into(),
            ));
        }
        let skew = self.auth.refresh_expiry_clock_skew_in_minutes;
        if !(0..=MAX_CLOCK_SKEW_MINUTES).contains(&skew) {
            return Err(SessionwardError::Config(format!(
                "auth.refresh_expiry_clock_skew_in_minutes must be between 0 and \
                 {MAX_CLOCK_SKEW_MINUTES} (got {skew})"
            )));
        }
        if self.http.refresh_timeout_secs == 0 || self.http.dispatch_timeout_secs == 0 {
            return Err(SessionwardError::Config("http timeouts must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Behaviour of the token core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Present the id token instead of the access token as bearer credential.
    pub use_id_token_for_http_authentication: bool,
    /// Margin subtracted from a token's expiry before it is considered stale.
    pub refresh_expiry_clock_skew_in_minutes: i64,
    /// Principal claim used as the identity key.
    pub user_identifier_claim_name: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            use_id_token_for_http_authentication: false,
            refresh_expiry_clock_skew_in_minutes: DEFAULT_CLOCK_SKEW_MINUTES,
            user_identifier_claim_name: DEFAULT_USER_IDENTIFIER_CLAIM.to_string(),
        }
    }
}

/// Identity provider endpoints and client credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub token_url: String,
    /// Revocation endpoint; the token endpoint is used when absent.
    pub revocation_url: Option<String>,
}

/// Timeouts for the two suspension points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub refresh_timeout_secs: u64,
    pub dispatch_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            dispatch_timeout_secs: DEFAULT_DISPATCH_TIMEOUT_SECS,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `sessionward_core=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), format: LogFormat::Pretty }
    }
}
