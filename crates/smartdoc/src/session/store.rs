//! Session registry keyed by session id

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::Session;

/// Shared handle to one session
///
/// The lock is never held across an `.await`.
pub type SessionHandle = Arc<RwLock<Session>>;

/// In-memory registry isolating each user's session
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionHandle>,
    /// Live sessions allowed before the least recently used is evicted
    max_sessions: usize,
}

impl SessionStore {
    /// Create a store holding at most `max_sessions` sessions
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create a new empty session and return its id
    pub fn create(&self) -> Uuid {
        if self.sessions.len() >= self.max_sessions {
            self.evict_least_recent();
        }

        let session = Session::new();
        let id = session.id();
        self.sessions.insert(id, Arc::new(RwLock::new(session)));
        tracing::debug!("Created session {} ({} live)", id, self.sessions.len());
        id
    }

    /// Look up a session
    pub fn get(&self, id: &Uuid) -> Result<SessionHandle> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::SessionNotFound(*id))
    }

    /// Drop a session; returns whether it existed
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().read().last_active())
            .map(|entry| *entry.key());

        if let Some(id) = oldest {
            self.sessions.remove(&id);
            tracing::info!("Evicted least recently used session {}", id);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(1000)
    }
}
