//! In-flight request registry (the duplicate-request guard).
//!
//! A user may have at most one request in flight. `try_acquire` either
//! registers the user and hands back an [`ActiveGuard`], or fails fast with
//! [`DispatchError::Busy`]. Dropping the guard releases the user, on success
//! and failure alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use parley_types::error::DispatchError;

#[derive(Debug, Clone, Copy)]
struct ActiveEntry {
    ticket: u64,
    started_at: Instant,
}

/// Registry of users with a request in flight.
///
/// Cloning produces a shared view (backed by `Arc`).
#[derive(Debug, Clone, Default)]
pub struct ActiveRequests {
    inner: Arc<DashMap<String, ActiveEntry>>,
    next_ticket: Arc<AtomicU64>,
}

impl ActiveRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `user_id` as busy, or return `Busy` if it already is.
    ///
    /// Check-and-insert happens under a single entry lock, so two racing
    /// calls for the same user cannot both succeed.
    pub fn try_acquire(&self, user_id: &str) -> Result<ActiveGuard, DispatchError> {
        match self.inner.entry(user_id.to_string()) {
            Entry::Occupied(_) => Err(DispatchError::Busy(user_id.to_string())),
            Entry::Vacant(vacant) => {
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                vacant.insert(ActiveEntry {
                    ticket,
                    started_at: Instant::now(),
                });
                Ok(ActiveGuard {
                    registry: self.clone(),
                    user_id: user_id.to_string(),
                    ticket,
                })
            }
        }
    }

    pub fn is_active(&self, user_id: &str) -> bool {
        self.inner.contains_key(user_id)
    }

    /// Number of users with a request in flight.
    pub fn active_count(&self) -> usize {
        self.inner.len()
    }

    /// Drop markers whose request started more than `timeout` before `now`.
    /// Returns the user ids removed, sorted.
    pub fn sweep_idle(&self, now: Instant, timeout: Duration) -> Vec<String> {
        let stale: Vec<String> = self
            .inner
            .iter()
            .filter(|r| now.saturating_duration_since(r.value().started_at) > timeout)
            .map(|r| r.key().clone())
            .collect();

        let mut removed = Vec::with_capacity(stale.len());
        for user_id in stale {
            // Re-check under the entry lock: the marker may have been
            // released and re-acquired since the scan.
            if self
                .inner
                .remove_if(&user_id, |_, e| {
                    now.saturating_duration_since(e.started_at) > timeout
                })
                .is_some()
            {
                removed.push(user_id);
            }
        }
        removed.sort();
        removed
    }

    fn release(&self, user_id: &str, ticket: u64) {
        self.inner.remove_if(user_id, |_, e| e.ticket == ticket);
    }
}

/// Releases the user's in-flight marker on drop.
///
/// Only removes the marker it created; if the reaper already swept it and a
/// newer request re-registered the user, the newer marker is left alone.
#[derive(Debug)]
pub struct ActiveGuard {
    registry: ActiveRequests,
    user_id: String,
    ticket: u64,
}

impl ActiveGuard {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.registry.release(&self.user_id, self.ticket);
    }
}
