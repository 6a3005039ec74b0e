//! Run context for one orchestration run.
//!
//! `RunContext` bundles the shared mutable state every user task touches:
//! the session tracker, the timeline, and the in-flight registry. Build one
//! per run and drop it afterwards; nothing leaks from one run into the next.

use crate::session::active::ActiveRequests;
use crate::session::tracker::SessionTracker;
use crate::timeline::TimelineRecorder;

/// Shared state of one run. Cloning shares the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub sessions: SessionTracker,
    pub timeline: TimelineRecorder,
    pub active: ActiveRequests,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::timeline::TimelineEntry;

    #[test]
    fn clones_share_state() {
        let ctx = RunContext::new();
        let other = ctx.clone();
        ctx.sessions.set("a1", "resp_1");
        ctx.timeline.append(TimelineEntry::send("a1", "0", None, "hi"));
        let _guard = ctx.active.try_acquire("a1").unwrap();

        assert_eq!(other.sessions.get("a1").as_deref(), Some("resp_1"));
        assert_eq!(other.timeline.len(), 1);
        assert!(other.active.is_active("a1"));
    }

    #[test]
    fn separate_runs_are_isolated() {
        let first = RunContext::new();
        first.sessions.set("a1", "resp_1");
        let second = RunContext::new();
        assert_eq!(second.sessions.get("a1"), None);
        assert!(second.timeline.is_empty());
    }
}
