//! Integration tests for the token lifecycle
//!
//! Drives the store, refresher and state bridge together against the mock
//! identity provider.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use sessionward_common::auth::{TokenResponse, TokenSet};
use sessionward_common::testing::MockOAuthClient;
use sessionward_core::{
    ExpiryPolicy, RefreshOutcome, SessionStateBridge, TokenRefresher, TokenStore,
};
use sessionward_domain::{Identity, SessionState};

struct Harness {
    store: Arc<TokenStore>,
    client: MockOAuthClient,
    refresher: TokenRefresher,
    bridge: SessionStateBridge,
}

fn harness() -> Harness {
    let store = Arc::new(TokenStore::new());
    let client = MockOAuthClient::new();
    let refresher = TokenRefresher::with_timeout(
        Arc::clone(&store),
        Arc::new(client.clone()),
        Duration::from_secs(2),
    );
    let bridge = SessionStateBridge::new(Arc::clone(&store));
    Harness { store, client, refresher, bridge }
}

/// Validates the expired-token refresh without rotation.
///
/// # Test Steps
/// 1. Store a set that expired one second ago, policy skew 5 minutes
/// 2. Provider answers `{access_token: "A2", expires_in: 3600}`
/// 3. Verify access token, retained refresh token and the new expiry
#[tokio::test]
async fn test_expired_set_is_refreshed_and_keeps_refresh_token() {
    let h = harness();
    let identity = Identity::new("user-1");
    h.store.set(
        &identity,
        TokenSet::new(
            Some("I1".into()),
            Some("A1".into()),
            Some("R1".into()),
            Some(Utc::now() - ChronoDuration::seconds(1)),
        ),
    );
    h.client.push_refresh_response(TokenResponse::new("A2", Some(3600)));

    let outcome = h.refresher.refresh_if_needed(&identity, &ExpiryPolicy::default()).await;

    assert_eq!(outcome, RefreshOutcome::Refreshed);
    let tokens = h.store.get(&identity).expect("tokens stored");
    assert_eq!(tokens.access_token.as_deref(), Some("A2"));
    assert_eq!(tokens.refresh_token.as_deref(), Some("R1"));
    let remaining = tokens.seconds_until_expiry(Utc::now()).expect("expiry known");
    assert!((3590..=3600).contains(&remaining), "unexpected expiry: {remaining}");
}

/// Validates that rotated refresh tokens are used by the next exchange.
#[tokio::test]
async fn test_rotated_refresh_token_is_used_next() -> anyhow::Result<()> {
    let h = harness();
    let identity = Identity::new("user-1");
    h.store.set(&identity, TokenSet::new(None, Some("A1".into()), Some("R1".into()), None));
    h.client.push_refresh_response(TokenResponse::new("A2", Some(60)).with_refresh_token("R2"));
    h.client.push_refresh_response(TokenResponse::new("A3", Some(60)));

    assert!(h.refresher.refresh(&identity).await);
    assert!(h.refresher.refresh(&identity).await);

    assert_eq!(h.client.refresh_tokens_seen(), vec!["R1".to_string(), "R2".to_string()]);
    let stored = h.store.get(&identity).ok_or_else(|| anyhow::anyhow!("session was cleared"))?;
    assert_eq!(stored.refresh_token.as_deref(), Some("R2"));
    Ok(())
}

/// Validates that racing clears notify observers exactly once.
///
/// # Test Steps
/// 1. Sign an identity in and subscribe
/// 2. Race sixteen `clear_session` calls
/// 3. Verify a single `Authenticated -> Anonymous` notification
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_clears_notify_once() {
    let h = harness();
    let identity = Identity::new("user-1");
    h.store.set(&identity, TokenSet::new(None, Some("A1".into()), Some("R1".into()), None));
    let mut subscription = h.bridge.subscribe();

    let clears = (0..16).map(|_| {
        let bridge = h.bridge.clone();
        let identity = identity.clone();
        tokio::spawn(async move { bridge.clear_session(&identity) })
    });
    let removed: Vec<bool> =
        futures::future::join_all(clears).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(removed.iter().filter(|r| **r).count(), 1);
    let change = subscription.try_recv().expect("one transition");
    assert!(change.is_expiry());
    assert!(subscription.try_recv().is_none());
    assert_eq!(h.bridge.get_session_state(&identity), SessionState::Anonymous);
}

/// Validates that sessions of different identities refresh independently.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_identities_refresh_independently() {
    let h = harness();
    h.client.set_delay(Duration::from_millis(50));
    let alice = Identity::new("alice");
    let bob = Identity::new("bob");
    for identity in [&alice, &bob] {
        h.store.set(identity, TokenSet::new(None, Some("A1".into()), Some("R1".into()), None));
    }

    let (a, b) = tokio::join!(h.refresher.refresh(&alice), h.refresher.refresh(&bob));

    assert!(a && b);
    assert_eq!(h.client.refresh_calls(), 2);
}
