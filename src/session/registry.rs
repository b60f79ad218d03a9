//! Process-wide session registry.
//!
//! An explicit object owned by the engine (not ambient global state), so
//! session lifetime and concurrent-access discipline stay auditable. The
//! registry hands exclusive ownership of a session to the call operating on
//! it: [`take`](SessionRegistry::take) removes the entry, and only a paused
//! session is re-inserted. Callers must not issue two concurrent
//! continuation calls against the same session id; that is a caller-enforced
//! invariant, and behavior is undefined if violated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::state::ShellSession;

pub struct SessionRegistry {
    next_id: AtomicU64,
    sessions: Mutex<HashMap<u64, ShellSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate the next session id. Monotonic, never reused.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Store a live (paused) session.
    pub fn insert(&self, session: ShellSession) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session.id, session);
    }

    /// Remove and return a session, transferring exclusive ownership to the
    /// caller.
    pub fn take(&self, id: u64) -> Option<ShellSession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&id)
    }

    /// Ids of all currently paused sessions, sorted.
    pub fn ids(&self) -> Vec<u64> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<u64> = sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
