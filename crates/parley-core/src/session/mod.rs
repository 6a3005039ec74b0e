//! Per-user session state.
//!
//! - `SessionTracker`: user id -> latest continuation token (plus chatbot history)
//! - `ActiveRequests`: which users currently have a request in flight
//! - `IdleReaper`: cancellable periodic sweep of stale in-flight markers

pub mod active;
pub mod reaper;
pub mod tracker;
