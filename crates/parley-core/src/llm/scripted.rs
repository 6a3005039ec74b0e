//! In-memory provider for tests.
//!
//! Replies `echo: <last user message>` unless a canned reply is registered,
//! hands out sequential `resp_N` ids, can delay or fail on specific messages,
//! and records every request plus the peak number of concurrent calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_types::llm::{LlmError, MessageRole, ResponseReply, ResponseRequest, Usage};

use super::provider::ResponsesProvider;

#[derive(Default)]
struct Script {
    latency: HashMap<String, Duration>,
    failures: HashMap<String, String>,
    replies: HashMap<String, String>,
}

/// Cloning shares the same script and recordings.
#[derive(Clone, Default)]
pub(crate) struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
    default_latency: Duration,
    requests: Arc<Mutex<Vec<ResponseRequest>>>,
    next_id: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    pub(crate) fn delay_on(self, message: &str, latency: Duration) -> Self {
        self.script
            .lock()
            .unwrap()
            .latency
            .insert(message.to_string(), latency);
        self
    }

    pub(crate) fn fail_on(self, message: &str, error: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .failures
            .insert(message.to_string(), error.to_string());
        self
    }

    pub(crate) fn reply_on(self, message: &str, reply: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(message.to_string(), reply.to_string());
        self
    }

    pub(crate) fn requests(&self) -> Vec<ResponseRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn last_user_message(request: &ResponseRequest) -> String {
        request
            .input
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

impl ResponsesProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn respond(&self, request: &ResponseRequest) -> Result<ResponseReply, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let message = Self::last_user_message(request);

        let (latency, failure, reply) = {
            let script = self.script.lock().unwrap();
            (
                script
                    .latency
                    .get(&message)
                    .copied()
                    .unwrap_or(self.default_latency),
                script.failures.get(&message).cloned(),
                script.replies.get(&message).cloned(),
            )
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = failure {
            return Err(LlmError::Provider { message: error });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ResponseReply {
            id: format!("resp_{id}"),
            output_text: reply.unwrap_or_else(|| format!("echo: {message}")),
            model: request.model.clone(),
            request_id: Some(format!("req_{id}")),
            usage: Usage::default(),
        })
    }
}
