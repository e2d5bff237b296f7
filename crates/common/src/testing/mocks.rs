//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{OAuthClientError, OAuthClientTrait, OAuthError, TokenResponse};

/// Mock OAuth client for testing token refresh flows
///
/// Counts calls, records the refresh tokens it was handed, and replays
/// scripted responses in order. When the script is empty a default rotated
/// token response is returned. Clones share state, so a test can keep one
/// handle while the code under test owns another.
///
/// # Examples
///
/// ```
/// use sessionward_common::auth::{OAuthClientTrait, TokenResponse};
/// use sessionward_common::testing::MockOAuthClient;
///
/// # async fn example() {
/// let client = MockOAuthClient::new();
/// client.push_refresh_response(TokenResponse::new("A2", Some(3600)));
///
/// let response = client.refresh_access_token("R1").await.unwrap();
/// assert_eq!(response.access_token, "A2");
/// assert_eq!(client.refresh_calls(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockOAuthClient {
    state: Arc<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    refresh_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
    responses: Mutex<VecDeque<TokenResponse>>,
    refresh_tokens_seen: Mutex<Vec<String>>,
    revoked_tokens: Mutex<Vec<String>>,
    should_fail: Mutex<bool>,
    revoke_should_fail: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
}

impl MockOAuthClient {
    /// Create a new mock OAuth client with default state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response returned by `refresh_access_token`.
    pub fn push_refresh_response(&self, response: TokenResponse) {
        self.state.responses.lock().push_back(response);
    }

    /// Force refresh calls to fail with `invalid_grant`.
    pub fn set_should_fail(&self, should_fail: bool) {
        *self.state.should_fail.lock() = should_fail;
    }

    /// Force revocation calls to fail.
    pub fn set_revoke_should_fail(&self, should_fail: bool) {
        *self.state.revoke_should_fail.lock() = should_fail;
    }

    /// Delay every call, to widen race windows in concurrency tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }

    /// Number of refresh exchanges attempted.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of revocations attempted.
    #[must_use]
    pub fn revoke_calls(&self) -> usize {
        self.state.revoke_calls.load(Ordering::SeqCst)
    }

    /// Check whether refresh was called.
    #[must_use]
    pub fn was_refresh_called(&self) -> bool {
        self.refresh_calls() > 0
    }

    /// Refresh tokens presented to the provider, in call order.
    #[must_use]
    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.state.refresh_tokens_seen.lock().clone()
    }

    /// Tokens presented for revocation, in call order.
    #[must_use]
    pub fn revoked_tokens(&self) -> Vec<String> {
        self.state.revoked_tokens.lock().clone()
    }

    async fn wait(&self) {
        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.state.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.state.refresh_tokens_seen.lock().push(refresh_token.to_string());
        self.wait().await;

        if *self.state.should_fail.lock() {
            return Err(OAuthClientError::OAuthError(OAuthError {
                error: "invalid_grant".to_string(),
                error_description: Some("mock failure".to_string()),
            }));
        }

        let scripted = self.state.responses.lock().pop_front();
        Ok(scripted.unwrap_or_else(|| {
            TokenResponse::new("refreshed_access_token", Some(3600))
                .with_refresh_token("refreshed_refresh_token")
        }))
    }

    async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError> {
        self.state.revoke_calls.fetch_add(1, Ordering::SeqCst);
        self.state.revoked_tokens.lock().push(token.to_string());
        self.wait().await;

        if *self.state.revoke_should_fail.lock() {
            return Err(OAuthClientError::UnexpectedStatus { status: 503 });
        }
        Ok(())
    }
}
