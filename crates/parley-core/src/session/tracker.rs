//! Session tracker: user id -> most recent continuation token.
//!
//! Backed by `DashMap`, so writes for different users never contend on the
//! same entry. Values are cloned on read so no guard is ever held across an
//! `.await`.

use std::sync::Arc;

use dashmap::DashMap;

use parley_types::llm::InputMessage;

/// Everything remembered about one user for the lifetime of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    /// Continuation token of the last successful reply.
    pub continuation: Option<String>,
    /// Completed message pairs since the remote conversation was last reset.
    pub pairs_since_reset: u32,
    /// User/assistant messages, oldest first.
    pub history: Vec<InputMessage>,
    /// Short log of user messages shown back to the model as recent context.
    pub interactions: Vec<String>,
}

/// Concurrent per-user session store.
///
/// Cloning produces a shared view of the same data (backed by `Arc`).
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    inner: Arc<DashMap<String, UserSession>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continuation token for `user_id`, or `None` if the user has not had a
    /// successful turn yet.
    pub fn get(&self, user_id: &str) -> Option<String> {
        self.inner
            .get(user_id)
            .and_then(|s| s.value().continuation.clone())
    }

    /// Record the continuation token returned by the user's latest reply.
    /// Creates the session on first use.
    pub fn set(&self, user_id: &str, token: impl Into<String>) {
        self.inner
            .entry(user_id.to_string())
            .or_default()
            .continuation = Some(token.into());
    }

    /// Cloned snapshot of the user's session, or a fresh one if absent.
    pub fn session(&self, user_id: &str) -> UserSession {
        self.inner
            .get(user_id)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Apply `f` to the user's session under the entry lock, creating the
    /// session first if needed. `f` must not block.
    pub fn update<F>(&self, user_id: &str, f: F)
    where
        F: FnOnce(&mut UserSession),
    {
        let mut entry = self.inner.entry(user_id.to_string()).or_default();
        f(entry.value_mut());
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.inner.contains_key(user_id)
    }

    /// Snapshot of all known user ids, sorted.
    pub fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        users.sort();
        users
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
