//! Session state as observed by collaborators outside the core

use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// Externally observable session status for one identity.
///
/// Always derived from the token store, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Authenticated,
    Anonymous,
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// A single state transition for one identity.
///
/// `previous` and `current` always differ for published changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStateChange {
    pub identity: Identity,
    pub previous: SessionState,
    pub current: SessionState,
}

impl SessionStateChange {
    /// The session ended (logout, revocation or unrecoverable 401).
    #[must_use]
    pub const fn is_expiry(&self) -> bool {
        matches!(
            (self.previous, self.current),
            (SessionState::Authenticated, SessionState::Anonymous)
        )
    }
}

/// Which token of a set is presented as the outbound bearer credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BearerCredential {
    #[default]
    AccessToken,
    IdToken,
}

impl BearerCredential {
    /// Map the `use_id_token_for_http_authentication` setting.
    #[must_use]
    pub const fn from_setting(use_id_token: bool) -> Self {
        if use_id_token {
            Self::IdToken
        } else {
            Self::AccessToken
        }
    }
}
