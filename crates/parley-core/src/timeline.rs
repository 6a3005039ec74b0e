//! Timeline recorder.
//!
//! Append-only log of send/receive/failed events shared by every user task
//! in a run. Insertion order is whatever the scheduler produced; reports must
//! go through [`TimelineRecorder::finalize`], which re-sorts by timestamp.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parley_types::timeline::{EventKind, FinalizedEntry, TimelineEntry};

/// Shared, append-only event log.
///
/// Cloning produces a shared view (backed by `Arc<Mutex<...>>`).
#[derive(Debug, Clone, Default)]
pub struct TimelineRecorder {
    entries: Arc<Mutex<Vec<TimelineEntry>>>,
}

impl TimelineRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TimelineEntry>> {
        // Entries are immutable once pushed, so a poisoned lock still holds
        // a consistent vector.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, entry: TimelineEntry) {
        self.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Entries in insertion order.
    pub fn snapshot(&self) -> Vec<TimelineEntry> {
        self.lock().clone()
    }

    /// Entries of one user in insertion order. A user's own entries are
    /// appended by a single task, so this order is also their causal order.
    pub fn entries_for(&self, user_id: &str) -> Vec<TimelineEntry> {
        self.lock()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of entries of `kind`, optionally restricted to one user.
    pub fn count(&self, kind: EventKind, user_id: Option<&str>) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.kind == kind && user_id.is_none_or(|u| e.user_id == u))
            .count()
    }

    /// Entries sorted ascending by timestamp, each with its offset from the
    /// earliest entry in seconds.
    pub fn finalize(&self) -> Vec<FinalizedEntry> {
        let mut entries = self.snapshot();
        sort_by_time(&mut entries);

        let Some(t0) = entries.first().map(|e| e.at) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .map(|entry| {
                let elapsed = (entry.at - t0)
                    .num_microseconds()
                    .map(|us| us as f64 / 1_000_000.0)
                    .unwrap_or_default();
                FinalizedEntry { entry, elapsed }
            })
            .collect()
    }
}

/// Stable sort by timestamp. Entries with equal timestamps keep their
/// relative order, so sorting an already sorted slice is a no-op.
pub fn sort_by_time(entries: &mut [TimelineEntry]) {
    entries.sort_by_key(|e| e.at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry_at(user: &str, offset_ms: i64, kind: EventKind) -> TimelineEntry {
        let mut e = TimelineEntry::send(user, "cafebabe", None, "m");
        e.kind = kind;
        e.at = Utc::now() + Duration::milliseconds(offset_ms);
        e
    }

    #[test]
    fn finalize_empty_timeline() {
        assert!(TimelineRecorder::new().finalize().is_empty());
    }

    #[test]
    fn finalize_sorts_and_computes_elapsed() {
        let timeline = TimelineRecorder::new();
        let base = Utc::now();
        for (user, ms) in [("b", 300), ("a", 0), ("c", 150)] {
            let mut e = TimelineEntry::send(user, "00000000", None, "m");
            e.at = base + Duration::milliseconds(ms);
            timeline.append(e);
        }

        let finalized = timeline.finalize();
        let users: Vec<&str> = finalized.iter().map(|f| f.entry.user_id.as_str()).collect();
        assert_eq!(users, vec!["a", "c", "b"]);
        assert_eq!(finalized[0].elapsed, 0.0);
        assert!((finalized[1].elapsed - 0.150).abs() < 1e-9);
        assert!((finalized[2].elapsed - 0.300).abs() < 1e-9);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut entries = vec![
            entry_at("a", 20, EventKind::Send),
            entry_at("b", 10, EventKind::Send),
            entry_at("c", 10, EventKind::Receive),
            entry_at("d", 0, EventKind::Send),
        ];
        sort_by_time(&mut entries);
        let once = entries.clone();
        sort_by_time(&mut entries);
        assert_eq!(entries, once);
    }

    #[test]
    fn count_filters_by_kind_and_user() {
        let timeline = TimelineRecorder::new();
        timeline.append(entry_at("a", 0, EventKind::Send));
        timeline.append(entry_at("a", 1, EventKind::Receive));
        timeline.append(entry_at("b", 2, EventKind::Send));
        timeline.append(entry_at("b", 3, EventKind::Failed));

        assert_eq!(timeline.count(EventKind::Send, None), 2);
        assert_eq!(timeline.count(EventKind::Send, Some("a")), 1);
        assert_eq!(timeline.count(EventKind::Receive, Some("b")), 0);
        assert_eq!(timeline.count(EventKind::Failed, Some("b")), 1);
        assert_eq!(timeline.entries_for("a").len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_all_kept() {
        let timeline = TimelineRecorder::new();
        let mut handles = Vec::new();
        for u in 0..10 {
            let timeline = timeline.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    timeline.append(TimelineEntry::send(&format!("u{u}"), "0", None, "m"));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(timeline.len(), 500);
        assert_eq!(timeline.count(EventKind::Send, Some("u3")), 50);
    }
}
