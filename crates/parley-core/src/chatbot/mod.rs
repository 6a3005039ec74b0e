//! Tool-aware multi-user chatbot built on the same session, guard and
//! timeline primitives as the dispatcher.
//!
//! - `command`: `TOOL_CALL:` detection in model output
//! - `tools`: the `Tool` trait and `ToolRegistry`
//! - `builtin`: example tools registered by the CLI
//! - `prompt`: developer prompt assembly
//! - `service`: `ChatbotService` (per-message flow, batch processing)

pub mod builtin;
pub mod command;
pub mod prompt;
pub mod service;
pub mod tools;

pub use service::{ChatRequest, ChatbotService};
pub use tools::{Tool, ToolRegistry};
