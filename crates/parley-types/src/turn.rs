//! Conversation turn types.
//!
//! A turn is one message-and-reply exchange within a user's ordered
//! sequence. Turns move `Pending -> Sent -> (Completed | Failed)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Pending,
    Sent,
    Completed,
    Failed,
}

impl TurnState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: TurnState) -> bool {
        matches!(
            (self, next),
            (TurnState::Pending, TurnState::Sent)
                | (TurnState::Sent, TurnState::Completed)
                | (TurnState::Sent, TurnState::Failed)
        )
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::Pending => write!(f, "pending"),
            TurnState::Sent => write!(f, "sent"),
            TurnState::Completed => write!(f, "completed"),
            TurnState::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub user_id: String,
    pub correlation_id: String,
    pub message: String,
    /// Token the request was chained on (`None` for a user's first turn).
    pub previous_response_id: Option<String>,
    /// Token returned by this turn's reply.
    pub response_id: String,
    pub request_id: Option<String>,
    /// Full reply text (the timeline only keeps an excerpt).
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

impl TurnRecord {
    /// Round-trip latency in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.received_at - self.sent_at).num_milliseconds()
    }
}

/// A turn that failed and ended the user's sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnFailure {
    pub correlation_id: String,
    pub message: String,
    /// Zero-based position of the failed turn in the user's sequence.
    pub index: usize,
    pub error: String,
}

/// Outcome of one user's whole sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOutcome {
    pub user_id: String,
    /// Completed turns in order, truncated at the first failure.
    pub turns: Vec<TurnRecord>,
    pub failure: Option<TurnFailure>,
    /// Number of messages the user had queued.
    pub planned: usize,
}

impl UserOutcome {
    /// Number of turns actually sent (completed plus the failed one, if any).
    pub fn attempted(&self) -> usize {
        self.turns.len() + usize::from(self.failure.is_some())
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.turns.len() == self.planned
    }

    /// Token returned by the last completed turn.
    pub fn last_response_id(&self) -> Option<&str> {
        self.turns.last().map(|t| t.response_id.as_str())
    }
}

/// How a message was dispatched relative to the previous reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlap {
    /// First message; nothing to compare against.
    First,
    /// Sent after the previous reply arrived.
    Sequential,
    /// Sent before the previous reply arrived.
    Parallel,
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overlap::First => write!(f, "first"),
            Overlap::Sequential => write!(f, "sequential"),
            Overlap::Parallel => write!(f, "parallel"),
        }
    }
}
