//! Responses-service abstractions for Parley.
//!
//! - `ResponsesProvider`: RPITIT trait for concrete service adapters
//! - `BoxResponsesProvider`: object-safe wrapper for dynamic dispatch

pub mod box_provider;
pub mod provider;

#[cfg(test)]
pub(crate) mod scripted;
