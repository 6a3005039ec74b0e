//! `parley sequential`: one user's messages in order, with a timing check.

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Input;
use serde_json::json;

use parley_core::dispatch::ordering::{analyze_overlap, is_strictly_sequential};

use super::render::{timing_table, truncate};
use crate::state::AppState;

pub async fn run_sequential(
    state: &AppState,
    user: &str,
    count: usize,
    messages: Vec<String>,
    json: bool,
) -> Result<()> {
    let messages = if messages.is_empty() {
        prompt_messages(count)?
    } else {
        messages
    };
    if messages.is_empty() {
        bail!("No messages to send");
    }

    let dispatcher = state.dispatcher();
    let outcome = dispatcher
        .run_user(user.to_string(), messages.clone())
        .await
        .with_context(|| format!("Cannot run messages for user '{user}'"))?;
    let timings = analyze_overlap(&outcome.turns);

    if json {
        let doc = json!({
            "user_id": outcome.user_id,
            "timings": timings,
            "turns": outcome.turns,
            "failure": outcome.failure,
            "sequential": is_strictly_sequential(&timings),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!();
    println!("{}", timing_table(&timings));
    println!();

    // Replies in the order the messages were written.
    for (message, turn) in messages.iter().zip(&outcome.turns) {
        println!(
            "  {} {}  {}  {}",
            style("•").cyan(),
            style(truncate(message, 40)).bold(),
            style("→").dim(),
            truncate(&turn.text, 120)
        );
    }

    if let Some(failure) = &outcome.failure {
        println!();
        println!(
            "  {} Message {} failed: {}",
            style("✗").red().bold(),
            failure.index + 1,
            failure.error
        );
        let skipped = outcome.planned - failure.index - 1;
        if skipped > 0 {
            println!("    {skipped} later message(s) were not sent");
        }
    }

    println!();
    if is_strictly_sequential(&timings) {
        println!(
            "  {} Every message was sent after the previous reply arrived",
            style("✓").green()
        );
    } else {
        println!(
            "  {} Some messages were sent before the previous reply arrived",
            style("⚠").yellow()
        );
    }
    println!();
    Ok(())
}

/// Ask for up to `count` messages; an empty answer stops early.
fn prompt_messages(count: usize) -> Result<Vec<String>> {
    let mut messages = Vec::with_capacity(count);
    for i in 1..=count {
        let message: String = Input::new()
            .with_prompt(format!("Message {i}"))
            .allow_empty(true)
            .interact_text()
            .context("Failed to read message")?;
        if message.trim().is_empty() {
            break;
        }
        messages.push(message);
    }
    Ok(messages)
}
