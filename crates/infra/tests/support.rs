#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sessionward_common::auth::TokenSet;
use sessionward_common::testing::MockOAuthClient;
use sessionward_domain::{OAuthSettings, Principal, SessionwardConfig};
use sessionward_infra::SessionwardContext;

/// Configuration pointing the identity provider at `token_url`.
pub fn test_config(token_url: impl Into<String>) -> SessionwardConfig {
    let mut config = SessionwardConfig {
        oauth: OAuthSettings {
            client_id: "web-app".into(),
            client_secret: Some("s3cret".into()),
            token_url: token_url.into(),
            revocation_url: None,
        },
        ..SessionwardConfig::default()
    };
    config.http.dispatch_timeout_secs = 5;
    config.http.refresh_timeout_secs = 5;
    config
}

/// Context whose provider calls go to a shared `MockOAuthClient`.
pub fn context_with_mock(config: SessionwardConfig) -> (SessionwardContext, MockOAuthClient) {
    let client = MockOAuthClient::new();
    let context = SessionwardContext::with_oauth_client(config, Arc::new(client.clone()))
        .expect("context should build");
    (context, client)
}

/// Authenticated principal identified by `sub`.
pub fn principal(sub: &str) -> Principal {
    Principal::authenticated(Vec::new()).with_claim("sub", sub)
}

/// Tokens valid for another hour.
pub fn fresh_tokens(access: &str, refresh: &str) -> TokenSet {
    TokenSet::new(
        None,
        Some(access.to_string()),
        Some(refresh.to_string()),
        Some(Utc::now() + Duration::hours(1)),
    )
}

/// Tokens that expired a minute ago.
pub fn expired_tokens(access: &str, refresh: &str) -> TokenSet {
    TokenSet::new(
        None,
        Some(access.to_string()),
        Some(refresh.to_string()),
        Some(Utc::now() - Duration::minutes(1)),
    )
}

/// A GET request for `path` on `base`.
pub fn get(base: &str, path: &str) -> reqwest::Request {
    reqwest::Client::new().get(format!("{base}{path}")).build().expect("request should build")
}
