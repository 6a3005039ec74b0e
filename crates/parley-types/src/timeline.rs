//! Timeline entry types.
//!
//! A timeline is the post-hoc record of every remote call made during a run:
//! one `send` entry when a request leaves, then either a `receive` or a
//! `failed` entry for the same correlation id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Send,
    Receive,
    Failed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Send => write!(f, "send"),
            EventKind::Receive => write!(f, "receive"),
            EventKind::Failed => write!(f, "failed"),
        }
    }
}

/// One immutable timeline event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub kind: EventKind,
    pub at: DateTime<Utc>,
    pub user_id: String,
    pub correlation_id: String,
    /// For `send`: the continuation token the request was chained on.
    /// For `receive`: the continuation token returned by the service.
    /// For `failed`: the token that was in effect when the call failed.
    pub context_token: Option<String>,
    /// Message text for `send`, reply excerpt for `receive`, error for `failed`.
    pub text: String,
    /// Service-side request id, only on `receive`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl TimelineEntry {
    pub fn send(
        user_id: &str,
        correlation_id: &str,
        previous_token: Option<String>,
        message: &str,
    ) -> Self {
        Self {
            kind: EventKind::Send,
            at: Utc::now(),
            user_id: user_id.to_string(),
            correlation_id: correlation_id.to_string(),
            context_token: previous_token,
            text: message.to_string(),
            request_id: None,
        }
    }

    pub fn receive(
        user_id: &str,
        correlation_id: &str,
        new_token: &str,
        excerpt: String,
        request_id: Option<String>,
    ) -> Self {
        Self {
            kind: EventKind::Receive,
            at: Utc::now(),
            user_id: user_id.to_string(),
            correlation_id: correlation_id.to_string(),
            context_token: Some(new_token.to_string()),
            text: excerpt,
            request_id,
        }
    }

    pub fn failed(
        user_id: &str,
        correlation_id: &str,
        token_in_effect: Option<String>,
        error: String,
    ) -> Self {
        Self {
            kind: EventKind::Failed,
            at: Utc::now(),
            user_id: user_id.to_string(),
            correlation_id: correlation_id.to_string(),
            context_token: token_in_effect,
            text: error,
            request_id: None,
        }
    }
}

/// A timeline entry placed on the run's relative clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedEntry {
    #[serde(flatten)]
    pub entry: TimelineEntry,
    /// Seconds since the earliest entry of the run.
    pub elapsed: f64,
}

/// Truncate `text` to at most `max_chars` characters (not bytes).
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
