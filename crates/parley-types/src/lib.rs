//! Shared domain types for Parley.
//!
//! This crate contains the data shapes that flow between the dispatcher,
//! the timeline, the chatbot service and the provider adapters: requests and
//! replies of the responses service, timeline entries, turn records, tool
//! commands, configuration, scenarios, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod scenario;
pub mod timeline;
pub mod tool;
pub mod turn;
