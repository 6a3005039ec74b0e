//! Tool command and outcome types.
//!
//! Models may ask for a tool by emitting a line of the form
//! `TOOL_CALL:<name>:<parameters>` in their reply. The parsed form is a
//! [`ToolCommand`]; running the tool yields a [`ToolOutcome`].

use serde::{Deserialize, Serialize};

/// Marker that introduces a tool call in model output.
pub const TOOL_CALL_PREFIX: &str = "TOOL_CALL:";

/// Parsed tool request extracted from model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolCommand {
    /// The model asked for `name`. `arguments` is `None` when the model gave
    /// no parameter segment.
    Call {
        name: String,
        arguments: Option<String>,
        /// The raw `TOOL_CALL:...` line, echoed back in follow-up calls.
        raw: String,
    },
    /// Plain reply; no tool requested.
    NotACommand,
}

/// Result of running a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub data: serde_json::Value,
    pub message: String,
}

impl ToolOutcome {
    pub fn ok(data: serde_json::Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            message: message.into(),
        }
    }
}

/// Name and usage hint of a registered tool, used to build the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_command_serializes_tagged() {
        let cmd = ToolCommand::Call {
            name: "wordCount".into(),
            arguments: Some("a b".into()),
            raw: "TOOL_CALL:wordCount:a b".into(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["kind"], "call");
        assert_eq!(json["name"], "wordCount");

        let none = serde_json::to_value(ToolCommand::NotACommand).unwrap();
        assert_eq!(none["kind"], "not_a_command");
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = ToolOutcome::ok(json!({"n": 2}), "done");
        assert!(ok.success);
        assert_eq!(ok.data["n"], 2);

        let failed = ToolOutcome::failed("nope");
        assert!(!failed.success);
        assert!(failed.data.is_null());
    }
}
