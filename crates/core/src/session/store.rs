//! Per-identity token store
//!
//! The store is the single source of truth for token material. Every mutation
//! replaces the whole `TokenSet` behind an `Arc`, so readers never observe a
//! partially written set. Mutations for one identity are serialized by the
//! map's entry lock, and a state transition is published while that lock is
//! held: events for one identity arrive in commit order, each carrying the
//! session state before and after the mutation. Mutations that leave the
//! derived state unchanged (token rotation, a repeated clear) publish nothing.
//! Every observer has its own unbounded queue, so no transition is dropped for
//! a slow observer.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use sessionward_common::auth::TokenSet;
use sessionward_domain::{Identity, SessionState};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::session_state_of;

/// What happened to a store entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEventKind {
    Changed,
    Cleared,
}

/// A session state transition caused by a `set`, commit or `clear`
///
/// `previous` and `current` always differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub identity: Identity,
    pub kind: StoreEventKind,
    pub previous: SessionState,
    pub current: SessionState,
}

/// Result of a conditional commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The new set replaced the expected snapshot
    Committed,
    /// Another writer replaced the snapshot first; nothing was written
    Superseded,
    /// The entry was cleared meanwhile; nothing was written
    Missing,
}

/// Concurrency-safe mapping from identity to its current token set
#[derive(Debug)]
pub struct TokenStore {
    entries: DashMap<Identity, Arc<TokenSet>>,
    observers: Mutex<Vec<mpsc::UnboundedSender<StoreEvent>>>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: DashMap::new(), observers: Mutex::new(Vec::new()) }
    }

    /// Current set for `identity`, if any
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<Arc<TokenSet>> {
        self.entries.get(identity).map(|entry| Arc::clone(entry.value()))
    }

    /// Replace the set for `identity` unconditionally
    pub fn set(&self, identity: &Identity, tokens: TokenSet) {
        let next = Arc::new(tokens);
        match self.entries.entry(identity.clone()) {
            Entry::Occupied(mut occupied) => {
                let previous = session_state_of(Some(occupied.get().as_ref()));
                let current = session_state_of(Some(next.as_ref()));
                occupied.insert(next);
                self.publish(identity, StoreEventKind::Changed, previous, current);
            }
            Entry::Vacant(vacant) => {
                let current = session_state_of(Some(next.as_ref()));
                vacant.insert(next);
                self.publish(identity, StoreEventKind::Changed, SessionState::Anonymous, current);
            }
        }
    }

    /// Record tokens handed over by the sign-in collaborator
    ///
    /// A missing expiry is filled from the id token's `exp` claim.
    pub fn capture(&self, identity: &Identity, tokens: TokenSet) {
        debug!(identity = %identity, "capturing session tokens");
        self.set(identity, tokens.with_id_token_expiry());
    }

    /// Replace `expected` with `tokens` only if it is still the stored set
    ///
    /// A refresh commits through here so that a late result can neither
    /// overwrite a newer set nor resurrect a cleared session.
    pub fn compare_and_set(
        &self,
        identity: &Identity,
        expected: &Arc<TokenSet>,
        tokens: TokenSet,
    ) -> CommitOutcome {
        let Some(mut entry) = self.entries.get_mut(identity) else {
            return CommitOutcome::Missing;
        };
        if !Arc::ptr_eq(entry.value(), expected) {
            return CommitOutcome::Superseded;
        }

        let previous = session_state_of(Some(entry.value().as_ref()));
        let current = session_state_of(Some(&tokens));
        *entry = Arc::new(tokens);
        self.publish(identity, StoreEventKind::Changed, previous, current);
        CommitOutcome::Committed
    }

    /// Remove the entry for `identity`
    ///
    /// Returns `true` if an entry existed. Clearing an absent entry publishes
    /// nothing.
    pub fn clear(&self, identity: &Identity) -> bool {
        match self.entries.entry(identity.clone()) {
            Entry::Occupied(occupied) => {
                let (_, removed) = occupied.remove_entry();
                let previous = session_state_of(Some(removed.as_ref()));
                self.publish(identity, StoreEventKind::Cleared, previous, SessionState::Anonymous);
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Whether an entry (possibly an empty set) exists for `identity`
    #[must_use]
    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Number of identities with an entry
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribe to state transitions
    ///
    /// The observer is unregistered once the receiver is dropped.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.observers.lock().push(sender);
        receiver
    }

    fn publish(
        &self,
        identity: &Identity,
        kind: StoreEventKind,
        previous: SessionState,
        current: SessionState,
    ) {
        trace!(identity = %identity, ?kind, ?previous, ?current, "store event");
        if previous == current {
            return;
        }

        let event = StoreEvent { identity: identity.clone(), kind, previous, current };
        self.observers.lock().retain(|observer| observer.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session::store.
    use super::*;

    fn tokens(access: &str) -> TokenSet {
        TokenSet::new(None, Some(access.to_string()), Some("refresh".to_string()), None)
    }

    /// Validates `TokenStore::set` and `get` behavior.
    ///
    /// Assertions:
    /// - Confirms an unknown identity has no entry.
    /// - Confirms the stored set is returned whole.
    #[test]
    fn test_set_and_get() {
        let store = TokenStore::new();
        let identity = Identity::new("user-1");
        assert!(store.get(&identity).is_none());

        store.set(&identity, tokens("A1"));

        let stored = store.get(&identity).unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("A1"));
        assert_eq!(store.len(), 1);
    }

    /// Validates that an explicit empty set is distinct from no entry.
    #[test]
    fn test_empty_set_is_distinct_from_absence() {
        let store = TokenStore::new();
        let identity = Identity::new("user-1");

        store.set(&identity, TokenSet::empty());

        assert!(store.contains(&identity));
        assert!(store.get(&identity).unwrap().is_empty());
    }

    /// Validates event publication for set, change and clear.
    ///
    /// Assertions:
    /// - First set is an `Anonymous -> Authenticated` transition.
    /// - A second set publishes nothing.
    /// - The first clear transitions back; the second publishes nothing.
    #[test]
    fn test_events_carry_transitions() {
        let store = TokenStore::new();
        let mut events = store.subscribe();
        let identity = Identity::new("user-1");

        store.set(&identity, tokens("A1"));
        store.set(&identity, tokens("A2"));
        assert!(store.clear(&identity));
        assert!(!store.clear(&identity));

        let first = events.try_recv().unwrap();
        assert_eq!(first.kind, StoreEventKind::Changed);
        assert_eq!(first.previous, SessionState::Anonymous);
        assert_eq!(first.current, SessionState::Authenticated);

        let cleared = events.try_recv().unwrap();
        assert_eq!(cleared.kind, StoreEventKind::Cleared);
        assert_eq!(cleared.previous, SessionState::Authenticated);
        assert_eq!(cleared.current, SessionState::Anonymous);

        assert!(events.try_recv().is_err());
    }

    /// Validates that dropped observers are unregistered.
    #[test]
    fn test_dropped_observer_is_released() {
        let store = TokenStore::new();
        let dropped = store.subscribe();
        let mut kept = store.subscribe();
        drop(dropped);

        store.set(&Identity::new("user-1"), tokens("A1"));

        assert!(kept.try_recv().is_ok());
        assert_eq!(store.observers.lock().len(), 1);
    }

    /// Validates `compare_and_set` against current, replaced and cleared
    /// snapshots.
    #[test]
    fn test_compare_and_set() {
        let store = TokenStore::new();
        let identity = Identity::new("user-1");
        store.set(&identity, tokens("A1"));
        let snapshot = store.get(&identity).unwrap();

        assert_eq!(
            store.compare_and_set(&identity, &snapshot, tokens("A2")),
            CommitOutcome::Committed
        );
        assert_eq!(
            store.compare_and_set(&identity, &snapshot, tokens("A3")),
            CommitOutcome::Superseded
        );
        assert_eq!(store.get(&identity).unwrap().access_token.as_deref(), Some("A2"));

        store.clear(&identity);
        assert_eq!(
            store.compare_and_set(&identity, &snapshot, tokens("A4")),
            CommitOutcome::Missing
        );
        assert!(store.get(&identity).is_none());
    }

    /// Validates that `capture` derives expiry from the id token.
    #[test]
    fn test_capture_fills_expiry_from_id_token() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;

        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"user-1","exp":1900000000}"#);
        let id_token = format!("h.{payload}.s");
        let store = TokenStore::new();
        let identity = Identity::new("user-1");

        store.capture(&identity, TokenSet::new(Some(id_token), None, None, None));

        let stored = store.get(&identity).unwrap();
        assert_eq!(stored.expires_at.map(|at| at.timestamp()), Some(1_900_000_000));
    }
}
