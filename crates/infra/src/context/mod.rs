//! Process-wide wiring
//!
//! `SessionwardContext` owns the one `TokenStore` of a running server and
//! hands out the components built on top of it. Create it once at startup
//! and share it (it is cheap to clone).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Request, Response};
use serde::Serialize;
use sessionward_common::auth::{OAuthClient, OAuthClientTrait, OAuthConfig, TokenSet};
use sessionward_core::{
    resolve_identity, session_state_of, ExpiryPolicy, RefreshOutcome, SessionStateBridge,
    TokenRefresher, TokenStore,
};
use sessionward_domain::{
    BearerCredential, Identity, OAuthSettings, Principal, Result, SessionState, SessionwardConfig,
    SessionwardError,
};
use tracing::{info, warn};

use crate::config;
use crate::http::{AuthenticatedDispatcher, HttpClient};

/// Redacted view of a session for diagnostics
///
/// Carries presence flags only, never token material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationStatus {
    pub identity: Identity,
    pub state: SessionState,
    pub has_id_token: bool,
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub seconds_until_expiry: Option<i64>,
    pub needs_refresh: bool,
}

/// The wired token lifecycle for one server process
#[derive(Debug, Clone)]
pub struct SessionwardContext {
    config: Arc<SessionwardConfig>,
    store: Arc<TokenStore>,
    policy: ExpiryPolicy,
    refresher: TokenRefresher,
    bridge: SessionStateBridge,
    dispatcher: AuthenticatedDispatcher,
}

impl SessionwardContext {
    /// Load configuration (env, then file) and wire everything
    ///
    /// # Errors
    /// Returns `SessionwardError::Config` if no valid configuration is found.
    pub fn from_env() -> Result<Self> {
        Self::new(config::load()?)
    }

    /// Wire everything against the configured identity provider
    ///
    /// # Errors
    /// Returns `SessionwardError::Config` for invalid configuration or if the
    /// HTTP client cannot be built.
    pub fn new(config: SessionwardConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::from_settings(&config.http)?;
        let oauth = OAuthClient::with_timeout(
            oauth_config(&config.oauth),
            Duration::from_secs(config.http.refresh_timeout_secs),
        )
        .map_err(|e| SessionwardError::Config(e.to_string()))?;
        Ok(Self::assemble(config, http, Arc::new(oauth)))
    }

    /// Wire everything against a caller-supplied provider client
    ///
    /// # Errors
    /// Returns `SessionwardError::Config` for invalid configuration or if the
    /// HTTP client cannot be built.
    pub fn with_oauth_client(
        config: SessionwardConfig,
        client: Arc<dyn OAuthClientTrait>,
    ) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::from_settings(&config.http)?;
        Ok(Self::assemble(config, http, client))
    }

    fn assemble(
        config: SessionwardConfig,
        http: HttpClient,
        client: Arc<dyn OAuthClientTrait>,
    ) -> Self {
        let store = Arc::new(TokenStore::new());
        let policy = ExpiryPolicy::from_settings(&config.auth);
        let refresher = TokenRefresher::with_timeout(
            Arc::clone(&store),
            client,
            Duration::from_secs(config.http.refresh_timeout_secs),
        );
        let bridge = SessionStateBridge::new(Arc::clone(&store));
        let dispatcher = AuthenticatedDispatcher::new(
            http,
            refresher.clone(),
            bridge.clone(),
            policy,
            BearerCredential::from_setting(config.auth.use_id_token_for_http_authentication),
        );

        info!(
            claim = %config.auth.user_identifier_claim_name,
            clock_skew_minutes = config.auth.refresh_expiry_clock_skew_in_minutes,
            use_id_token = config.auth.use_id_token_for_http_authentication,
            "session token lifecycle initialised"
        );

        Self { config: Arc::new(config), store, policy, refresher, bridge, dispatcher }
    }

    pub fn config(&self) -> &SessionwardConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub const fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    pub const fn refresher(&self) -> &TokenRefresher {
        &self.refresher
    }

    pub const fn bridge(&self) -> &SessionStateBridge {
        &self.bridge
    }

    pub const fn dispatcher(&self) -> &AuthenticatedDispatcher {
        &self.dispatcher
    }

    /// Identity of `principal` under the configured claim
    ///
    /// # Errors
    /// Returns `SessionwardError::MissingIdentityClaim` for an authenticated
    /// principal without the claim.
    pub fn resolve_identity(&self, principal: &Principal) -> Result<Option<Identity>> {
        resolve_identity(principal, &self.config.auth.user_identifier_claim_name)
    }

    /// Record the tokens obtained at sign-in for `principal`
    ///
    /// # Errors
    /// Returns `SessionwardError::InvalidInput` for an anonymous principal and
    /// `MissingIdentityClaim` when the claim is absent.
    pub fn capture_tokens(&self, principal: &Principal, tokens: TokenSet) -> Result<Identity> {
        let identity = self.resolve_identity(principal)?.ok_or_else(|| {
            SessionwardError::InvalidInput("cannot capture tokens for an anonymous principal".into())
        })?;
        self.store.capture(&identity, tokens);
        Ok(identity)
    }

    /// Keep a session usable: refresh when due, clear it when that fails
    ///
    /// Returns whether the identity is still authenticated afterwards.
    pub async fn validate_session(&self, identity: &Identity) -> bool {
        match self.refresher.refresh_if_needed(identity, &self.policy).await {
            RefreshOutcome::Failed => {
                warn!(identity = %identity, "stale session could not be refreshed; rejecting");
                self.bridge.clear_session(identity);
                false
            }
            RefreshOutcome::Refreshed => true,
            RefreshOutcome::NotNeeded => {
                self.bridge.get_session_state(identity).is_authenticated()
            }
        }
    }

    /// Redacted snapshot of the session of `identity`
    pub fn status(&self, identity: &Identity) -> AuthenticationStatus {
        let now = Utc::now();
        let tokens = self.store.get(identity);
        let tokens = tokens.as_deref();

        AuthenticationStatus {
            identity: identity.clone(),
            state: session_state_of(tokens),
            has_id_token: tokens.is_some_and(|t| t.id_token.is_some()),
            has_access_token: tokens.is_some_and(|t| t.access_token.is_some()),
            has_refresh_token: tokens.is_some_and(|t| t.refresh_token.is_some()),
            expires_at: tokens.and_then(|t| t.expires_at),
            seconds_until_expiry: tokens.and_then(|t| t.seconds_until_expiry(now)),
            needs_refresh: tokens.is_some_and(|t| self.policy.needs_refresh(t, now)),
        }
    }

    /// Revoke the refresh token (best effort) and end the session
    pub async fn sign_out(&self, identity: &Identity) -> bool {
        info!(identity = %identity, "signing out");
        self.refresher.revoke(identity).await
    }

    /// Dispatch `request` for whoever `principal` is
    ///
    /// Anonymous principals are sent with an empty bearer.
    ///
    /// # Errors
    /// Returns `MissingIdentityClaim` for a misconfigured principal and
    /// `Network`/`Protocol` when no response was obtained.
    pub async fn dispatch_as(&self, principal: &Principal, request: Request) -> Result<Response> {
        let response = match self.resolve_identity(principal)? {
            Some(identity) => self.dispatcher.dispatch(&identity, request).await?,
            None => self.dispatcher.dispatch_anonymous(request).await?,
        };
        Ok(response)
    }
}

fn oauth_config(settings: &OAuthSettings) -> OAuthConfig {
    OAuthConfig::new(
        settings.client_id.clone(),
        settings.client_secret.clone(),
        settings.token_url.clone(),
        settings.revocation_url.clone(),
    )
}
