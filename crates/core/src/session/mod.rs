//! Session storage and observable session state

pub mod state;
pub mod store;

use sessionward_common::auth::TokenSet;
use sessionward_domain::{BearerCredential, SessionState};

pub use state::{SessionStateBridge, SessionSubscription};
pub use store::{CommitOutcome, StoreEvent, StoreEventKind, TokenStore};

/// Derive the session state of a (possibly absent) stored set.
#[must_use]
pub fn session_state_of(tokens: Option<&TokenSet>) -> SessionState {
    match tokens {
        Some(tokens) if tokens.has_credential() => SessionState::Authenticated,
        _ => SessionState::Anonymous,
    }
}

/// The token presented as bearer credential for `credential`.
#[must_use]
pub fn bearer_token(tokens: &TokenSet, credential: BearerCredential) -> Option<&str> {
    match credential {
        BearerCredential::AccessToken => tokens.access_token.as_deref(),
        BearerCredential::IdToken => tokens.id_token.as_deref(),
    }
}
