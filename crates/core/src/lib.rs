//! # Sessionward Core
//!
//! The concurrent token lifecycle - no HTTP types, no configuration loading.
//!
//! This crate contains:
//! - Identity resolution from a caller's principal
//! - The per-identity token store and its change events
//! - The expiry policy and the single-flight token refresher
//! - The session state bridge consumed by UI/navigation collaborators
//!
//! ## Architecture Principles
//! - Only depends on `sessionward-common` and `sessionward-domain`
//! - Identity provider access goes through `OAuthClientTrait`
//! - One `TokenStore` per process, shared through `Arc`

pub mod identity;
pub mod refresh;
pub mod session;

pub use identity::resolve_identity;
pub use refresh::{needs_refresh, ExpiryPolicy, RefreshOutcome, TokenRefresher};
pub use session::{
    bearer_token, session_state_of, CommitOutcome, SessionStateBridge, SessionSubscription,
    StoreEvent, StoreEventKind, TokenStore,
};
