//! `parley stress`: many users at once, each strictly in order.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;

use parley_infra::export::{RunExport, write_run};
use parley_infra::scenario::load_scenario;
use parley_types::scenario::Scenario;

use super::render::{outcomes_table, timeline_table};
use crate::state::AppState;

pub async fn run_stress(
    state: &AppState,
    scenario_path: Option<&Path>,
    export: Option<&Path>,
    json: bool,
) -> Result<()> {
    let scenario = match scenario_path {
        Some(path) => load_scenario(path)
            .await
            .with_context(|| format!("Failed to load scenario {}", path.display()))?,
        None => Scenario::demo(),
    };

    if !json {
        println!();
        println!(
            "  {} Dispatching {} messages for {} users (model {})",
            style("▶").cyan().bold(),
            style(scenario.message_count()).bold(),
            style(scenario.user_count()).bold(),
            style(&state.config.model).cyan()
        );
    }

    let dispatcher = state.dispatcher();
    let report = dispatcher.dispatch(&scenario).await?;

    let document = RunExport {
        exported_at: Utc::now(),
        total_seconds: report.total_seconds(),
        timeline: &report.timeline,
        outcomes: &report.outcomes,
    };

    if let Some(path) = export {
        write_run(path, &document).await?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!();
    println!("{}", timeline_table(&report.timeline));
    println!();
    println!("{}", outcomes_table(&report.outcomes));
    println!();
    println!(
        "  {} Total time: {:.2}s",
        style("⏱").bold(),
        report.total_seconds()
    );
    let failed = report.failed_users();
    if !failed.is_empty() {
        println!(
            "  {} {} user{} stopped early: {}",
            style("!").red().bold(),
            failed.len(),
            if failed.len() == 1 { "" } else { "s" },
            failed.join(", ")
        );
    }
    if let Some(path) = export {
        println!(
            "  {} Exported to {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }
    println!();
    Ok(())
}
