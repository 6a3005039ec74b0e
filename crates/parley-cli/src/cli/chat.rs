//! `parley chat`: one message per user through the tool-aware chatbot.

use anyhow::Result;
use console::style;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use parley_core::chatbot::ChatRequest;

use super::render::truncate;
use crate::state::AppState;

/// clap value parser for `user=message`.
pub fn parse_chat_request(raw: &str) -> Result<ChatRequest, String> {
    let (user, message) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected user=message, got '{raw}'"))?;
    let user = user.trim();
    if user.is_empty() {
        return Err("user id must not be empty".to_string());
    }
    if message.trim().is_empty() {
        return Err(format!("message for '{user}' must not be empty"));
    }
    Ok(ChatRequest::new(user, message))
}

fn demo_requests() -> Vec<ChatRequest> {
    vec![
        ChatRequest::new("user1", "Hello, how are you?"),
        ChatRequest::new("user2", "What time is it right now?"),
        ChatRequest::new("user3", "How many words are in: the quick brown fox jumps"),
    ]
}

pub async fn run_chat(state: &AppState, requests: Vec<ChatRequest>, json: bool) -> Result<()> {
    let requests = if requests.is_empty() {
        demo_requests()
    } else {
        requests
    };

    let bot = state.chatbot();
    let reaper = bot.spawn_reaper(
        state.sweep_interval(),
        state.idle_timeout(),
        CancellationToken::new(),
    );

    if !json {
        println!();
        println!(
            "  {} Processing {} users concurrently",
            style("▶").cyan().bold(),
            style(requests.len()).bold()
        );
    }

    let results = bot.process_many(requests.clone()).await;
    let reaped = reaper.shutdown().await;
    tracing::debug!(reaped, active = bot.active_count(), "Chat run finished");

    if json {
        let doc: Vec<_> = requests
            .iter()
            .zip(&results)
            .map(|(request, result)| match result {
                Ok(reply) => json!({ "user_id": request.user_id, "reply": reply }),
                Err(err) => json!({ "user_id": request.user_id, "error": err.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!();
    for (request, result) in requests.iter().zip(&results) {
        match result {
            Ok(reply) => println!(
                "  {} {}: {}",
                style("✓").green(),
                style(&request.user_id).yellow(),
                truncate(reply, 100)
            ),
            Err(err) => println!(
                "  {} {}: {}",
                style("✗").red(),
                style(&request.user_id).yellow(),
                style(format!("Error: {err}")).red()
            ),
        }
    }
    println!();
    Ok(())
}
