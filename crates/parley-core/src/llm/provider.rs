//! ResponsesProvider trait definition.
//!
//! This is the one abstraction every remote adapter implements. Uses RPITIT
//! for `respond`; [`super::box_provider::BoxResponsesProvider`] erases the
//! concrete type so it can be shared across spawned user tasks.

use parley_types::llm::{LlmError, ResponseReply, ResponseRequest};

/// Trait for responses-service backends.
///
/// Implementations live in parley-infra (e.g., `OpenAiResponsesProvider`).
pub trait ResponsesProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send one request and wait for the full reply.
    ///
    /// The reply's `id` is the continuation token for the next request in the
    /// same conversation. A transport or service failure yields no token.
    fn respond(
        &self,
        request: &ResponseRequest,
    ) -> impl std::future::Future<Output = Result<ResponseReply, LlmError>> + Send;
}
