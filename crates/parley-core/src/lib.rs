//! Orchestration core for Parley.
//!
//! Defines the provider "port" ([`llm::provider::ResponsesProvider`]) that
//! the infrastructure layer implements, plus everything that runs on top of
//! it: the per-user session tracker, the in-flight request guard and its
//! idle reaper, the timeline recorder, the per-user sequential / cross-user
//! concurrent dispatcher, and the tool-aware chatbot service.
//!
//! Depends on `parley-types` and the span conventions in `parley-observe`,
//! never on `parley-infra` or any HTTP crate.

pub mod chatbot;
pub mod dispatch;
pub mod llm;
pub mod session;
pub mod timeline;
