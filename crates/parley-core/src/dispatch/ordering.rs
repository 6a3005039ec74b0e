//! Post-hoc ordering check for one user's turns.
//!
//! Given the completed turns of a user, classifies each one as sent after
//! the previous reply arrived (`Sequential`) or before it (`Parallel`). A
//! correct dispatcher only ever produces `First` followed by `Sequential`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use parley_types::turn::{Overlap, TurnRecord};

/// Timing of one turn relative to its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnTiming {
    /// One-based position in the user's sequence.
    pub index: usize,
    pub correlation_id: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub overlap: Overlap,
}

pub fn analyze_overlap(turns: &[TurnRecord]) -> Vec<TurnTiming> {
    let mut previous_received: Option<DateTime<Utc>> = None;
    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let overlap = match previous_received {
                None => Overlap::First,
                Some(prev) if turn.sent_at >= prev => Overlap::Sequential,
                Some(_) => Overlap::Parallel,
            };
            previous_received = Some(turn.received_at);
            TurnTiming {
                index: i + 1,
                correlation_id: turn.correlation_id.clone(),
                message: turn.message.clone(),
                sent_at: turn.sent_at,
                received_at: turn.received_at,
                duration_ms: turn.duration_ms(),
                overlap,
            }
        })
        .collect()
}

/// True when no turn was sent before its predecessor's reply.
pub fn is_strictly_sequential(timings: &[TurnTiming]) -> bool {
    timings.iter().all(|t| t.overlap != Overlap::Parallel)
}
