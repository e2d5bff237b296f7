//! Token refresher - refresh-token grant, revocation and single-flight
//!
//! Concurrent refresh requests for one identity collapse onto a single
//! exchange with the identity provider. The exchange runs as its own task, so
//! a caller that is cancelled while waiting never cancels the refresh other
//! callers are waiting on. Results are committed with a compare-and-swap
//! against the snapshot the exchange started from.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use sessionward_common::auth::{OAuthClientError, OAuthClientTrait, TokenSet};
use sessionward_common::{ErrorClassification, ErrorSeverity};
use sessionward_domain::constants::DEFAULT_REFRESH_TIMEOUT_SECS;
use sessionward_domain::Identity;
use tracing::{debug, error, info, warn};

use super::policy::ExpiryPolicy;
use crate::session::{CommitOutcome, TokenStore};

type InFlightRefresh = Shared<BoxFuture<'static, bool>>;

/// Result of a policy-driven refresh check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing stored, or the stored set is still fresh
    NotNeeded,
    /// A refresh was due and succeeded
    Refreshed,
    /// A refresh was due and failed; the store is untouched
    Failed,
}

/// Refreshes and revokes the tokens held in a [`TokenStore`]
///
/// Cheap to clone; clones share the in-flight registry.
#[derive(Clone)]
pub struct TokenRefresher {
    inner: Arc<RefresherInner>,
}

struct RefresherInner {
    store: Arc<TokenStore>,
    client: Arc<dyn OAuthClientTrait>,
    timeout: Duration,
    in_flight: DashMap<Identity, InFlightRefresh>,
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("timeout", &self.inner.timeout)
            .field("in_flight", &self.inner.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl TokenRefresher {
    /// Create a refresher with the default exchange timeout
    pub fn new(store: Arc<TokenStore>, client: Arc<dyn OAuthClientTrait>) -> Self {
        Self::with_timeout(store, client, Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS))
    }

    /// Create a refresher whose provider calls are bounded by `timeout`
    pub fn with_timeout(
        store: Arc<TokenStore>,
        client: Arc<dyn OAuthClientTrait>,
        timeout: Duration,
    ) -> Self {
        Self { inner: Arc::new(RefresherInner { store, client, timeout, in_flight: DashMap::new() }) }
    }

    /// The store this refresher commits to
    #[must_use]
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.inner.store
    }

    /// Refresh the tokens of `identity` regardless of expiry
    ///
    /// Returns `true` once a refreshed set is in the store. Returns `false`
    /// without any network call when nothing (or no refresh token) is
    /// stored, and `false` with the store untouched when the exchange fails.
    pub async fn refresh(&self, identity: &Identity) -> bool {
        let Some(observed) = self.inner.store.get(identity) else {
            debug!(identity = %identity, "no tokens stored; refresh declined");
            return false;
        };
        self.refresh_observed(identity, &observed).await
    }

    /// Refresh on behalf of a caller that acted on the `observed` snapshot
    ///
    /// If the store already holds a different set, someone else refreshed in
    /// the meantime and `true` is returned without a network call. Callers
    /// arriving while an exchange is in flight wait for that exchange.
    pub async fn refresh_observed(&self, identity: &Identity, observed: &Arc<TokenSet>) -> bool {
        let refresh = match self.inner.in_flight.entry(identity.clone()) {
            Entry::Occupied(in_flight) => {
                debug!(identity = %identity, "joining in-flight refresh");
                in_flight.get().clone()
            }
            Entry::Vacant(vacant) => {
                let Some(current) = self.inner.store.get(identity) else {
                    debug!(identity = %identity, "session cleared; refresh declined");
                    return false;
                };
                if !Arc::ptr_eq(&current, observed) {
                    debug!(identity = %identity, "tokens already replaced; skipping refresh");
                    return true;
                }
                if current.refresh_token.is_none() {
                    debug!(identity = %identity, "no refresh token stored; refresh declined");
                    return false;
                }

                let task = tokio::spawn(exchange(
                    Arc::clone(&self.inner),
                    identity.clone(),
                    current,
                ));
                let refresh = task.map(|joined| joined.unwrap_or(false)).boxed().shared();
                vacant.insert(refresh.clone());
                refresh
            }
        };
        refresh.await
    }

    /// Refresh only if `policy` considers the stored set stale
    pub async fn refresh_if_needed(
        &self,
        identity: &Identity,
        policy: &ExpiryPolicy,
    ) -> RefreshOutcome {
        let Some(snapshot) = self.inner.store.get(identity) else {
            return RefreshOutcome::NotNeeded;
        };
        if !policy.needs_refresh(&snapshot, Utc::now()) {
            return RefreshOutcome::NotNeeded;
        }
        if self.refresh_observed(identity, &snapshot).await {
            RefreshOutcome::Refreshed
        } else {
            RefreshOutcome::Failed
        }
    }

    /// Revoke the stored refresh token, then clear the session
    ///
    /// Revocation is best-effort: the entry is cleared whatever the provider
    /// answers. Returns `true` if the provider confirmed the revocation.
    pub async fn revoke(&self, identity: &Identity) -> bool {
        let refresh_token =
            self.inner.store.get(identity).and_then(|tokens| tokens.refresh_token.clone());

        let revoked = match refresh_token {
            Some(token) => {
                match tokio::time::timeout(self.inner.timeout, self.inner.client.revoke_token(&token))
                    .await
                {
                    Ok(Ok(())) => {
                        info!(identity = %identity, "refresh token revoked");
                        true
                    }
                    Ok(Err(err)) => {
                        report_failure(identity, &err, "token revocation failed");
                        false
                    }
                    Err(_) => {
                        warn!(
                            identity = %identity,
                            timeout = ?self.inner.timeout,
                            "token revocation timed out"
                        );
                        false
                    }
                }
            }
            None => {
                debug!(identity = %identity, "no refresh token to revoke");
                false
            }
        };

        self.inner.store.clear(identity);
        revoked
    }
}

/// Removes the registry entry when the exchange task ends, even by panic
struct InFlightGuard {
    inner: Arc<RefresherInner>,
    identity: Identity,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.identity);
    }
}

/// Logs a provider failure at the level its severity calls for
fn report_failure(identity: &Identity, err: &OAuthClientError, message: &'static str) {
    let retryable = err.is_retryable();
    match err.severity() {
        ErrorSeverity::Info => debug!(identity = %identity, error = %err, retryable, "{message}"),
        ErrorSeverity::Warning => warn!(identity = %identity, error = %err, retryable, "{message}"),
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            error!(identity = %identity, error = %err, retryable, "{message}");
        }
    }
}

async fn exchange(inner: Arc<RefresherInner>, identity: Identity, snapshot: Arc<TokenSet>) -> bool {
    let _guard = InFlightGuard { inner: Arc::clone(&inner), identity: identity.clone() };
    let Some(refresh_token) = snapshot.refresh_token.as_deref() else {
        return false;
    };

    info!(identity = %identity, "refreshing session tokens");
    let response =
        match tokio::time::timeout(inner.timeout, inner.client.refresh_access_token(refresh_token))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                report_failure(&identity, &err, "token refresh failed");
                return false;
            }
            Err(_) => {
                warn!(
                    identity = %identity,
                    timeout = ?inner.timeout,
                    "token refresh timed out"
                );
                return false;
            }
        };

    let rotated = response.refresh_token.is_some();
    let next = TokenSet::from_refresh(&snapshot, response, Utc::now());
    match inner.store.compare_and_set(&identity, &snapshot, next) {
        CommitOutcome::Committed => {
            info!(identity = %identity, rotated, "refreshed tokens committed");
            true
        }
        CommitOutcome::Superseded => {
            debug!(identity = %identity, "tokens replaced during refresh; result discarded");
            true
        }
        CommitOutcome::Missing => {
            info!(identity = %identity, "session cleared during refresh; result discarded");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for refresh::service.
    use chrono::Duration as ChronoDuration;
    use sessionward_common::auth::TokenResponse;
    use sessionward_common::testing::MockOAuthClient;

    use super::*;

    fn setup() -> (Arc<TokenStore>, MockOAuthClient, TokenRefresher) {
        let store = Arc::new(TokenStore::new());
        let client = MockOAuthClient::new();
        let refresher = TokenRefresher::with_timeout(
            Arc::clone(&store),
            Arc::new(client.clone()),
            Duration::from_secs(1),
        );
        (store, client, refresher)
    }

    fn stored(refresh: Option<&str>, expires_in_secs: i64) -> TokenSet {
        TokenSet::new(
            Some("I1".into()),
            Some("A1".into()),
            refresh.map(str::to_string),
            Some(Utc::now() + ChronoDuration::seconds(expires_in_secs)),
        )
    }

    /// Validates the rotation law: a refresh token absent from the response
    /// is retained.
    ///
    /// Assertions:
    /// - Confirms `refresh` returns true.
    /// - Confirms the access token is replaced and the refresh token kept.
    /// - Confirms the stored refresh token was presented to the provider.
    #[tokio::test]
    async fn test_refresh_retains_refresh_token() {
        let (store, client, refresher) = setup();
        let identity = Identity::new("user-1");
        store.set(&identity, stored(Some("R1"), -1));
        client.push_refresh_response(TokenResponse::new("A2", Some(3600)));

        assert!(refresher.refresh(&identity).await);

        let tokens = store.get(&identity).unwrap();
        assert_eq!(tokens.access_token.as_deref(), Some("A2"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("R1"));
        assert_eq!(client.refresh_tokens_seen(), vec!["R1".to_string()]);
    }

    /// Validates that a missing refresh token declines without network or
    /// mutation.
    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let (store, client, refresher) = setup();
        let identity = Identity::new("user-1");
        store.set(&identity, stored(None, -1));
        let before = store.get(&identity).unwrap();

        assert!(!refresher.refresh(&identity).await);
        assert!(!refresher.refresh(&Identity::new("unknown")).await);

        assert_eq!(client.refresh_calls(), 0);
        assert!(Arc::ptr_eq(&before, &store.get(&identity).unwrap()));
    }

    /// Validates that a provider failure leaves the store untouched.
    #[tokio::test]
    async fn test_refresh_failure_leaves_store_untouched() {
        let (store, client, refresher) = setup();
        let identity = Identity::new("user-1");
        store.set(&identity, stored(Some("R1"), -1));
        let before = store.get(&identity).unwrap();
        client.set_should_fail(true);

        assert!(!refresher.refresh(&identity).await);

        assert_eq!(client.refresh_calls(), 1);
        assert!(Arc::ptr_eq(&before, &store.get(&identity).unwrap()));
    }

    /// Validates that a provider slower than the timeout counts as failure.
    #[tokio::test]
    async fn test_refresh_timeout() {
        let store = Arc::new(TokenStore::new());
        let client = MockOAuthClient::new();
        client.set_delay(Duration::from_millis(500));
        let refresher = TokenRefresher::with_timeout(
            Arc::clone(&store),
            Arc::new(client.clone()),
            Duration::from_millis(50),
        );
        let identity = Identity::new("user-1");
        store.set(&identity, stored(Some("R1"), -1));

        assert!(!refresher.refresh(&identity).await);
        assert_eq!(store.get(&identity).unwrap().access_token.as_deref(), Some("A1"));
    }

    /// Validates that an out-of-range provider lifetime still commits.
    ///
    /// Assertions:
    /// - Confirms `refresh` returns true.
    /// - Confirms the new access token is stored with unknown expiry.
    #[tokio::test]
    async fn test_refresh_with_out_of_range_lifetime() {
        let (store, client, refresher) = setup();
        let identity = Identity::new("user-1");
        store.set(&identity, TokenSet::new(None, Some("A1".into()), Some("R1".into()), None));
        client.push_refresh_response(TokenResponse::new("A2", Some(10_000_000_000_000)));

        assert!(refresher.refresh(&identity).await);

        let tokens = store.get(&identity).unwrap();
        assert_eq!(tokens.access_token.as_deref(), Some("A2"));
        assert!(tokens.expires_at.is_none());
    }

    /// Validates single-flight: concurrent callers share one exchange.
    ///
    /// Assertions:
    /// - Ensures every caller observes success.
    /// - Confirms exactly one provider call was made.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_coalesce() {
        let (store, client, refresher) = setup();
        client.set_delay(Duration::from_millis(100));
        let identity = Identity::new("user-1");
        store.set(&identity, stored(Some("R1"), -1));
        let snapshot = store.get(&identity).unwrap();

        let calls = (0..8).map(|_| {
            let refresher = refresher.clone();
            let identity = identity.clone();
            let snapshot = Arc::clone(&snapshot);
            tokio::spawn(async move { refresher.refresh_observed(&identity, &snapshot).await })
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.into_iter().all(|joined| joined.unwrap()));
        assert_eq!(client.refresh_calls(), 1);
    }

    /// Validates that a cancelled caller does not cancel the shared refresh.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_caller_does_not_cancel_refresh() {
        let (store, client, refresher) = setup();
        client.set_delay(Duration::from_millis(100));
        let identity = Identity::new("user-1");
        store.set(&identity, stored(Some("R1"), -1));

        let first = {
            let refresher = refresher.clone();
            let identity = identity.clone();
            tokio::spawn(async move { refresher.refresh(&identity).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        first.abort();

        tokio::time::sleep(Duration::from_millis(250)).await;
        let tokens = store.get(&identity).unwrap();
        assert_eq!(tokens.access_token.as_deref(), Some("refreshed_access_token"));
        assert_eq!(client.refresh_calls(), 1);
    }

    /// Validates that a stale observation skips the exchange.
    #[tokio::test]
    async fn test_stale_observation_skips_network() {
        let (store, client, refresher) = setup();
        let identity = Identity::new("user-1");
        store.set(&identity, stored(Some("R1"), -1));
        let stale = store.get(&identity).unwrap();
        store.set(&identity, stored(Some("R2"), 3600));

        assert!(refresher.refresh_observed(&identity, &stale).await);
        assert_eq!(client.refresh_calls(), 0);
    }

    /// Validates that a clear during an exchange is not undone by its commit.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_clear_during_refresh_is_not_resurrected() {
        let (store, client, refresher) = setup();
        client.set_delay(Duration::from_millis(100));
        let identity = Identity::new("user-1");
        store.set(&identity, stored(Some("R1"), -1));

        let pending = {
            let refresher = refresher.clone();
            let identity = identity.clone();
            tokio::spawn(async move { refresher.refresh(&identity).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.clear(&identity);

        assert!(!pending.await.unwrap());
        assert!(store.get(&identity).is_none());
    }

    /// Validates `refresh_if_needed` across fresh, stale and failing sets.
    #[tokio::test]
    async fn test_refresh_if_needed() {
        let (store, client, refresher) = setup();
        let policy = ExpiryPolicy::default();
        let identity = Identity::new("user-1");

        assert_eq!(refresher.refresh_if_needed(&identity, &policy).await, RefreshOutcome::NotNeeded);

        store.set(&identity, stored(Some("R1"), 3600));
        assert_eq!(refresher.refresh_if_needed(&identity, &policy).await, RefreshOutcome::NotNeeded);

        store.set(&identity, stored(Some("R1"), 60));
        assert_eq!(refresher.refresh_if_needed(&identity, &policy).await, RefreshOutcome::Refreshed);

        store.set(&identity, stored(Some("R1"), -1));
        client.set_should_fail(true);
        assert_eq!(refresher.refresh_if_needed(&identity, &policy).await, RefreshOutcome::Failed);
        assert_eq!(client.refresh_calls(), 2);
    }

    /// Validates best-effort revocation.
    ///
    /// Assertions:
    /// - A successful revocation clears the entry and reports true.
    /// - A failed revocation still clears the entry.
    #[tokio::test]
    async fn test_revoke_always_clears() {
        let (store, client, refresher) = setup();
        let identity = Identity::new("user-1");

        store.set(&identity, stored(Some("R1"), 3600));
        assert!(refresher.revoke(&identity).await);
        assert!(store.get(&identity).is_none());
        assert_eq!(client.revoked_tokens(), vec!["R1".to_string()]);

        store.set(&identity, stored(Some("R2"), 3600));
        client.set_revoke_should_fail(true);
        assert!(!refresher.revoke(&identity).await);
        assert!(store.get(&identity).is_none());

        assert!(!refresher.revoke(&identity).await);
        assert_eq!(client.revoke_calls(), 2);
    }
}
