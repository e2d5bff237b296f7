//! Session state bridge
//!
//! Exposes the authenticated/anonymous status of each identity to
//! collaborators outside the core (UI, navigation). State is recomputed from
//! the store on every query. Subscribers see each transition exactly once,
//! however many rotations happen in between: the store only publishes
//! transitions, into a queue per subscriber.

use std::sync::Arc;

use sessionward_domain::{Identity, SessionState, SessionStateChange};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::info;

use super::session_state_of;
use super::store::{StoreEvent, TokenStore};

/// Query/subscribe/clear interface over a [`TokenStore`]
#[derive(Debug, Clone)]
pub struct SessionStateBridge {
    store: Arc<TokenStore>,
}

impl SessionStateBridge {
    #[must_use]
    pub const fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    /// Current state for `identity`, derived from the store
    #[must_use]
    pub fn get_session_state(&self, identity: &Identity) -> SessionState {
        session_state_of(self.store.get(identity).as_deref())
    }

    /// Subscribe to session state transitions
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription { events: self.store.subscribe() }
    }

    /// Invoke `callback` for every transition until the store is dropped
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_session_state_changed<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(SessionStateChange) + Send + 'static,
    {
        let mut subscription = self.subscribe();
        tokio::spawn(async move {
            while let Some(change) = subscription.recv().await {
                callback(change);
            }
        })
    }

    /// End the session for `identity`
    ///
    /// Idempotent: clearing an anonymous identity notifies nobody.
    /// Returns `true` if an entry was removed.
    pub fn clear_session(&self, identity: &Identity) -> bool {
        let removed = self.store.clear(identity);
        if removed {
            info!(identity = %identity, "session cleared");
        }
        removed
    }
}

/// Stream of session state transitions
#[derive(Debug)]
pub struct SessionSubscription {
    events: UnboundedReceiver<StoreEvent>,
}

impl SessionSubscription {
    /// Wait for the next transition; `None` once the store is gone
    pub async fn recv(&mut self) -> Option<SessionStateChange> {
        self.events.recv().await.map(into_change)
    }

    /// Next transition already published, without waiting
    pub fn try_recv(&mut self) -> Option<SessionStateChange> {
        self.events.try_recv().ok().map(into_change)
    }
}

fn into_change(event: StoreEvent) -> SessionStateChange {
    SessionStateChange { identity: event.identity, previous: event.previous, current: event.current }
}
