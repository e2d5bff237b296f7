//! Domain types and models
//!
//! - [`identity`]: principals, claims and the identity key derived from them
//! - [`session`]: derived session state and its transitions

pub mod identity;
pub mod session;

pub use identity::{Claim, Identity, Principal};
pub use session::{BearerCredential, SessionState, SessionStateChange};
