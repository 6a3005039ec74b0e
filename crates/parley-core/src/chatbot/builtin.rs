//! Example tools registered by the CLI.

use chrono::{SecondsFormat, Utc};
use serde_json::json;

use parley_types::error::ToolError;
use parley_types::tool::ToolOutcome;

use super::tools::{Tool, ToolRegistry};

/// Reports the current UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentTime;

impl Tool for CurrentTime {
    fn name(&self) -> &str {
        "currentTime"
    }

    fn description(&self) -> &str {
        "Use for: questions about the current date or time (no parameters)"
    }

    async fn call(&self, _parameters: &str, _user_id: &str) -> Result<ToolOutcome, ToolError> {
        let now = Utc::now();
        Ok(ToolOutcome::ok(
            json!({
                "utc": now.to_rfc3339_opts(SecondsFormat::Secs, true),
                "unix": now.timestamp(),
            }),
            "Current time retrieved",
        ))
    }
}

/// Counts whitespace-separated words in its parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCount;

impl Tool for WordCount {
    fn name(&self) -> &str {
        "wordCount"
    }

    fn description(&self) -> &str {
        "Use for: counting the words in a piece of text (parameters: the text)"
    }

    async fn call(&self, parameters: &str, _user_id: &str) -> Result<ToolOutcome, ToolError> {
        let words = parameters.split_whitespace().count();
        let characters = parameters.chars().count();
        Ok(ToolOutcome::ok(
            json!({ "words": words, "characters": characters }),
            format!("Counted {words} words"),
        ))
    }
}

/// Registry holding every built-in tool.
pub fn builtin_registry() -> ToolRegistry {
    ToolRegistry::new().with(CurrentTime).with(WordCount)
}
