//! Table rendering shared by the commands.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};

use parley_core::dispatch::ordering::TurnTiming;
use parley_types::timeline::{EventKind, FinalizedEntry};
use parley_types::turn::{Overlap, UserOutcome};

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::White))
            .collect::<Vec<_>>(),
    );
    table
}

fn event_cell(kind: EventKind) -> Cell {
    let color = match kind {
        EventKind::Send => Color::Cyan,
        EventKind::Receive => Color::Green,
        EventKind::Failed => Color::Red,
    };
    Cell::new(kind.to_string()).fg(color)
}

/// Finalized timeline, one row per event.
pub fn timeline_table(timeline: &[FinalizedEntry]) -> Table {
    let mut table = new_table(&[
        "Elapsed", "Event", "User", "Correlation", "Token", "Request id", "Text",
    ]);
    for f in timeline {
        let e = &f.entry;
        table.add_row(vec![
            Cell::new(format!("{:.3}s", f.elapsed)).fg(Color::DarkGrey),
            event_cell(e.kind),
            Cell::new(&e.user_id).fg(Color::Yellow),
            Cell::new(&e.correlation_id).fg(Color::DarkGrey),
            Cell::new(e.context_token.as_deref().unwrap_or("-")),
            Cell::new(e.request_id.as_deref().unwrap_or("-")).fg(Color::DarkGrey),
            Cell::new(truncate(&e.text, 48)),
        ]);
    }
    table
}

/// One row per user: turns completed out of planned, last token, failure.
pub fn outcomes_table(outcomes: &[UserOutcome]) -> Table {
    let mut table = new_table(&["User", "Turns", "Last token", "Status"]);
    for outcome in outcomes {
        let status = match &outcome.failure {
            None => Cell::new("complete").fg(Color::Green),
            Some(failure) => Cell::new(format!(
                "failed at turn {}: {}",
                failure.index + 1,
                truncate(&failure.error, 60)
            ))
            .fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&outcome.user_id).fg(Color::Yellow),
            Cell::new(format!("{}/{}", outcome.turns.len(), outcome.planned)),
            Cell::new(outcome.last_response_id().unwrap_or("-")),
            status,
        ]);
    }
    table
}

/// Per-message timing with the overlap verdict.
pub fn timing_table(timings: &[TurnTiming]) -> Table {
    let mut table = new_table(&["#", "Correlation", "Sent", "Received", "Duration", "Order"]);
    for t in timings {
        let order = match t.overlap {
            Overlap::First => Cell::new("first").fg(Color::DarkGrey),
            Overlap::Sequential => Cell::new("sequential").fg(Color::Green),
            Overlap::Parallel => Cell::new("PARALLEL").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(t.index),
            Cell::new(&t.correlation_id).fg(Color::DarkGrey),
            Cell::new(t.sent_at.format("%H:%M:%S%.3f")),
            Cell::new(t.received_at.format("%H:%M:%S%.3f")),
            Cell::new(format!("{:.3}s", t.duration_ms as f64 / 1000.0)),
            order,
        ]);
    }
    table
}
