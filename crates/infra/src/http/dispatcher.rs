//! Authenticated dispatch
//!
//! Attaches the session's bearer token to outbound requests, refreshes it
//! proactively when the expiry policy says so, and recovers from a 401 by
//! forcing one refresh and retrying once. A call never produces more than two
//! HTTP requests. When recovery fails the session is cleared and the failed
//! response is handed back unchanged.

use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use sessionward_common::auth::TokenSet;
use sessionward_core::{bearer_token, ExpiryPolicy, SessionStateBridge, TokenRefresher};
use sessionward_domain::constants::BEARER_SCHEME;
use sessionward_domain::{BearerCredential, Identity};
use tracing::{debug, info, warn};

use super::client::HttpClient;
use crate::errors::DispatchError;

/// Bearer credential resolved for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBearer {
    pub token: Option<String>,
    /// A proactive refresh ran and succeeded while preparing
    pub was_refreshed: bool,
}

impl PreparedBearer {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Wraps outbound requests with token attachment and 401 recovery
#[derive(Debug, Clone)]
pub struct AuthenticatedDispatcher {
    http: HttpClient,
    refresher: TokenRefresher,
    bridge: SessionStateBridge,
    policy: ExpiryPolicy,
    credential: BearerCredential,
}

impl AuthenticatedDispatcher {
    pub fn new(
        http: HttpClient,
        refresher: TokenRefresher,
        bridge: SessionStateBridge,
        policy: ExpiryPolicy,
        credential: BearerCredential,
    ) -> Self {
        Self { http, refresher, bridge, policy, credential }
    }

    /// The bearer token to present for `identity`, refreshed first if stale
    pub async fn prepare(&self, identity: &Identity) -> Option<String> {
        self.prepare_with_status(identity).await.token
    }

    /// Like [`prepare`](Self::prepare), also reporting whether a refresh ran
    ///
    /// A failed proactive refresh does not stop preparation: whatever token
    /// remains is used and the resource server gets to decide.
    pub async fn prepare_with_status(&self, identity: &Identity) -> PreparedBearer {
        let (snapshot, was_refreshed) = self.prepare_snapshot(identity).await;
        PreparedBearer { token: self.token_of(snapshot.as_deref()), was_refreshed }
    }

    /// Send `request` on behalf of `identity`
    ///
    /// Any status other than 401 is returned as-is. On 401 a refresh is
    /// forced; if it succeeds the request is resent once with the new token.
    /// If the refresh fails or the retry is rejected too, the session is
    /// cleared and the last response is returned.
    ///
    /// # Errors
    /// Returns `DispatchError` only when no HTTP response was obtained.
    pub async fn dispatch(
        &self,
        identity: &Identity,
        request: Request,
    ) -> Result<Response, DispatchError> {
        let retry = request.try_clone();
        let (snapshot, _) = self.prepare_snapshot(identity).await;
        let token = self.token_of(snapshot.as_deref());

        let response = self.send_with_bearer(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        info!(identity = %identity, "request rejected with 401; forcing token refresh");
        let refreshed = match &snapshot {
            Some(snapshot) => self.refresher.refresh_observed(identity, snapshot).await,
            None => self.refresher.refresh(identity).await,
        };
        if !refreshed {
            self.expire(identity, "forced refresh failed");
            return Ok(response);
        }

        let Some(retry) = retry else {
            warn!(identity = %identity, "request body cannot be cloned; not retrying");
            return Ok(response);
        };

        let token = self.token_of(self.refresher.store().get(identity).as_deref());
        let retried = self.send_with_bearer(retry, token.as_deref()).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            self.expire(identity, "retry rejected with 401");
        } else {
            debug!(identity = %identity, status = %retried.status(), "retry after refresh succeeded");
        }
        Ok(retried)
    }

    /// Send `request` with an explicitly empty bearer, for anonymous callers
    ///
    /// # Errors
    /// Returns `DispatchError` only when no HTTP response was obtained.
    pub async fn dispatch_anonymous(&self, request: Request) -> Result<Response, DispatchError> {
        self.send_with_bearer(request, None).await
    }

    async fn prepare_snapshot(&self, identity: &Identity) -> (Option<Arc<TokenSet>>, bool) {
        let store = self.refresher.store();
        let Some(snapshot) = store.get(identity) else {
            return (None, false);
        };
        if !self.policy.needs_refresh(&snapshot, Utc::now()) {
            return (Some(snapshot), false);
        }

        debug!(identity = %identity, "tokens stale; refreshing before dispatch");
        let refreshed = self.refresher.refresh_observed(identity, &snapshot).await;
        (store.get(identity), refreshed)
    }

    fn token_of(&self, tokens: Option<&TokenSet>) -> Option<String> {
        tokens.and_then(|tokens| bearer_token(tokens, self.credential)).map(str::to_string)
    }

    async fn send_with_bearer(
        &self,
        mut request: Request,
        token: Option<&str>,
    ) -> Result<Response, DispatchError> {
        let mut value = HeaderValue::from_str(&format!("{BEARER_SCHEME} {}", token.unwrap_or("")))
            .map_err(|err| DispatchError::InvalidHeader(err.to_string()))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);

        self.http.execute(request).await
    }

    fn expire(&self, identity: &Identity, reason: &'static str) {
        warn!(identity = %identity, reason, "session expired");
        self.bridge.clear_session(identity);
    }
}
