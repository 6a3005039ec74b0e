//! One recorded remote call.
//!
//! Appends a `send` entry, awaits the provider, then appends exactly one of
//! `receive` or `failed` under the same correlation id. This is the only
//! suspension point in a turn.

use chrono::{DateTime, Utc};
use tracing::{Instrument, info, warn};
use uuid::Uuid;

use parley_observe::genai_attrs::{chat_span, record_response};
use parley_types::llm::{LlmError, ResponseReply, ResponseRequest};
use parley_types::timeline::{TimelineEntry, excerpt};

use crate::llm::box_provider::BoxResponsesProvider;
use crate::timeline::TimelineRecorder;

/// Short random id used only to match timeline entries of one request.
pub fn new_correlation_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// A successful reply together with its send/receive timestamps.
#[derive(Debug, Clone)]
pub struct RecordedReply {
    pub reply: ResponseReply,
    pub sent_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

/// Who is calling and how the call shows up in the timeline.
#[derive(Debug, Clone, Copy)]
pub struct CallLabel<'a> {
    pub user_id: &'a str,
    pub correlation_id: &'a str,
    /// Text logged on the `send` entry (the user's message, not the full prompt).
    pub sent_text: &'a str,
}

/// Perform `request` against `provider`, recording it on `timeline`.
pub async fn call_recorded(
    provider: &BoxResponsesProvider,
    timeline: &TimelineRecorder,
    label: CallLabel<'_>,
    request: &ResponseRequest,
    preview_chars: usize,
) -> Result<RecordedReply, LlmError> {
    let CallLabel {
        user_id,
        correlation_id,
        sent_text,
    } = label;

    let send = TimelineEntry::send(
        user_id,
        correlation_id,
        request.previous_response_id.clone(),
        sent_text,
    );
    let sent_at = send.at;
    timeline.append(send);

    info!(
        user_id,
        correlation_id,
        previous_response_id = request.previous_response_id.as_deref().unwrap_or("-"),
        message = %excerpt(sent_text, 30),
        "Sending"
    );

    let span = chat_span(
        provider.name(),
        &request.model,
        request.previous_response_id.as_deref(),
        user_id,
        correlation_id,
    );

    let result = provider.respond(request).instrument(span.clone()).await;

    match result {
        Ok(reply) => {
            record_response(
                &span,
                &reply.id,
                reply.usage.input_tokens,
                reply.usage.output_tokens,
            );
            let preview = excerpt(&reply.output_text, preview_chars);
            let receive = TimelineEntry::receive(
                user_id,
                correlation_id,
                &reply.id,
                preview,
                reply.request_id.clone(),
            );
            let received_at = receive.at;
            timeline.append(receive);

            info!(
                user_id,
                correlation_id,
                response_id = %reply.id,
                request_id = reply.request_id.as_deref().unwrap_or("-"),
                elapsed_ms = (received_at - sent_at).num_milliseconds(),
                "Received"
            );

            Ok(RecordedReply {
                reply,
                sent_at,
                received_at,
            })
        }
        Err(err) => {
            timeline.append(TimelineEntry::failed(
                user_id,
                correlation_id,
                request.previous_response_id.clone(),
                err.to_string(),
            ));
            warn!(user_id, correlation_id, error = %err, "Remote call failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedProvider;
    use parley_types::timeline::EventKind;

    #[test]
    fn correlation_ids_are_short_and_distinct() {
        let a = new_correlation_id();
        let b = new_correlation_id();
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn success_records_send_then_receive() {
        let provider = BoxResponsesProvider::new(ScriptedProvider::new());
        let timeline = TimelineRecorder::new();
        let request = ResponseRequest::user_text("m", "hello").continuing(Some("resp_0".into()));

        let recorded = call_recorded(
            &provider,
            &timeline,
            CallLabel {
                user_id: "a1",
                correlation_id: "12345678",
                sent_text: "hello",
            },
            &request,
            4,
        )
        .await
        .unwrap();

        let entries = timeline.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EventKind::Send);
        assert_eq!(entries[0].context_token.as_deref(), Some("resp_0"));
        assert_eq!(entries[1].kind, EventKind::Receive);
        assert_eq!(entries[1].context_token.as_deref(), Some(recorded.reply.id.as_str()));
        assert_eq!(entries[1].text, "echo");
        assert_eq!(entries[1].request_id.as_deref(), Some("req_1"));
        assert!(recorded.received_at >= recorded.sent_at);
    }

    #[tokio::test]
    async fn failure_records_send_then_failed() {
        let provider =
            BoxResponsesProvider::new(ScriptedProvider::new().fail_on("boom", "service down"));
        let timeline = TimelineRecorder::new();
        let request = ResponseRequest::user_text("m", "boom");

        let err = call_recorded(
            &provider,
            &timeline,
            CallLabel {
                user_id: "a1",
                correlation_id: "87654321",
                sent_text: "boom",
            },
            &request,
            200,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("service down"));
        assert_eq!(timeline.count(EventKind::Send, None), 1);
        assert_eq!(timeline.count(EventKind::Receive, None), 0);
        assert_eq!(timeline.count(EventKind::Failed, None), 1);
    }
}
