//! Infrastructure layer for Parley.
//!
//! Implements the provider port defined in `parley-core` against the OpenAI
//! Responses API, and owns everything that touches the outside world:
//! configuration and scenario files, environment credentials, and timeline
//! export.

pub mod config;
pub mod export;
pub mod llm;
pub mod scenario;
pub mod secret;
