//! Scenario file loader.
//!
//! A scenario file is TOML with one `[users]` table mapping each user id to
//! its ordered messages:
//!
//! ```toml
//! [users]
//! a1 = ["Hello", "Tell me more"]
//! b2 = ["What is 2+2?"]
//! ```

use std::path::Path;

use parley_types::error::ScenarioError;
use parley_types::scenario::Scenario;

/// Read, parse and validate a scenario file.
pub async fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ScenarioError::Io(format!("{}: {e}", path.display())))?;
    let scenario = parse_scenario(&content)?;
    tracing::debug!(
        path = %path.display(),
        users = scenario.user_count(),
        messages = scenario.message_count(),
        "Loaded scenario"
    );
    Ok(scenario)
}

/// Parse and validate scenario TOML.
pub fn parse_scenario(content: &str) -> Result<Scenario, ScenarioError> {
    let scenario: Scenario =
        toml::from_str(content).map_err(|e| ScenarioError::Parse(e.to_string()))?;
    scenario.validate()?;
    Ok(scenario)
}
