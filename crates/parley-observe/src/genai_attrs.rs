//! OpenTelemetry GenAI Semantic Convention attributes.
//!
//! Every remote call runs inside a span built by [`chat_span`]; attributes
//! only known after the reply arrives are filled in with the constants below.
//!
//! Span name: `"chat"`.

use tracing::Span;

/// The name of the operation being performed.
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "openai").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model ID requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The unique response ID; doubles as the continuation token.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The conversation the request continues (`previous_response_id`).
pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";

/// Standard chat operation.
pub const OP_CHAT: &str = "chat";

/// Span for one chat call of `user_id`.
///
/// Response id and token usage start empty; fill them with
/// [`record_response`].
pub fn chat_span(
    provider: &str,
    model: &str,
    previous_response_id: Option<&str>,
    user_id: &str,
    correlation_id: &str,
) -> Span {
    tracing::info_span!(
        "chat",
        gen_ai.operation.name = OP_CHAT,
        gen_ai.provider.name = provider,
        gen_ai.request.model = model,
        gen_ai.conversation.id = previous_response_id,
        gen_ai.response.id = tracing::field::Empty,
        gen_ai.usage.input_tokens = tracing::field::Empty,
        gen_ai.usage.output_tokens = tracing::field::Empty,
        user_id,
        correlation_id,
    )
}

/// Record the reply's id and token usage on a span from [`chat_span`].
pub fn record_response(span: &Span, response_id: &str, input_tokens: u32, output_tokens: u32) {
    span.record(GEN_AI_RESPONSE_ID, response_id);
    span.record(GEN_AI_USAGE_INPUT_TOKENS, input_tokens);
    span.record(GEN_AI_USAGE_OUTPUT_TOKENS, output_tokens);
}
