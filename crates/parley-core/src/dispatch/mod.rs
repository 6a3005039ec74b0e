//! Per-user sequential, cross-user concurrent request dispatch.
//!
//! - `RunContext`: the shared state of one orchestration run
//! - `exchange`: one remote call with its send/receive/failed timeline entries
//! - `Dispatcher`: drives every user's ordered message list, users in parallel
//! - `ordering`: post-hoc check of whether turns overlapped

pub mod context;
pub mod dispatcher;
pub mod exchange;
pub mod ordering;

pub use context::RunContext;
pub use dispatcher::{Dispatcher, RunReport};
