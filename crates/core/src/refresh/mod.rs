//! Token refresh: when to refresh and how

pub mod policy;
pub mod service;

pub use policy::{needs_refresh, ExpiryPolicy};
pub use service::{RefreshOutcome, TokenRefresher};
