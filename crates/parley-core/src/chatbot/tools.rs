//! Tool trait and name-indexed registry.
//!
//! Same shape as the provider port: an RPITIT `Tool` trait for implementors,
//! an object-safe `ToolDyn` with boxed futures, and a blanket impl joining
//! the two so the registry can hold heterogeneous tools.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use parley_types::error::ToolError;
use parley_types::tool::{ToolCommand, ToolDescriptor, ToolOutcome};

/// A capability the model can invoke with `TOOL_CALL:<name>:<parameters>`.
pub trait Tool: Send + Sync {
    /// Name the model uses in the call line.
    fn name(&self) -> &str;

    /// One-line usage hint shown in the system prompt.
    fn description(&self) -> &str;

    /// Run the tool. `user_id` identifies the caller for per-user data.
    fn call(
        &self,
        parameters: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<ToolOutcome, ToolError>> + Send;
}

/// Object-safe version of [`Tool`].
pub trait ToolDyn: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn call_boxed<'a>(
        &'a self,
        parameters: &'a str,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolError>> + Send + 'a>>;
}

impl<T: Tool> ToolDyn for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn description(&self) -> &str {
        Tool::description(self)
    }

    fn call_boxed<'a>(
        &'a self,
        parameters: &'a str,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolError>> + Send + 'a>> {
        Box::pin(self.call(parameters, user_id))
    }
}

/// Registry of available tools, indexed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn ToolDyn>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name, replacing any previous one.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools
            .insert(Tool::name(&tool).to_string(), Box::new(tool));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Name and description of every tool, sorted by name.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Look up and run `name`.
    pub async fn invoke(
        &self,
        name: &str,
        parameters: &str,
        user_id: &str,
    ) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.call_boxed(parameters, user_id).await
    }

    /// Run a parsed command. `fallback_parameters` (normally the user's
    /// message) is used when the command carries no parameter segment.
    ///
    /// Returns `None` for [`ToolCommand::NotACommand`]. Lookup and execution
    /// errors are folded into a failed [`ToolOutcome`].
    pub async fn execute(
        &self,
        command: &ToolCommand,
        fallback_parameters: &str,
        user_id: &str,
    ) -> Option<ToolOutcome> {
        let ToolCommand::Call {
            name, arguments, ..
        } = command
        else {
            return None;
        };
        let parameters = arguments.as_deref().unwrap_or(fallback_parameters);

        info!(user_id, tool = %name, parameters, "Executing tool");
        let outcome = match self.invoke(name, parameters, user_id).await {
            Ok(outcome) => {
                info!(user_id, tool = %name, success = outcome.success, message = %outcome.message, "Tool completed");
                outcome
            }
            Err(err @ ToolError::NotFound(_)) => {
                warn!(user_id, tool = %name, "Tool not available");
                ToolOutcome::failed(err.to_string())
            }
            Err(err) => {
                warn!(user_id, tool = %name, error = %err, "Tool failed");
                ToolOutcome::failed(err.to_string())
            }
        };
        Some(outcome)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Repeat the parameters back"
        }

        async fn call(&self, parameters: &str, user_id: &str) -> Result<ToolOutcome, ToolError> {
            Ok(ToolOutcome::ok(
                json!({ "echo": parameters, "user": user_id }),
                "echoed",
            ))
        }
    }

    struct Broken;

    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn call(&self, _: &str, _: &str) -> Result<ToolOutcome, ToolError> {
            Err(ToolError::Execution("disk on fire".into()))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new().with(Echo).with(Broken)
    }

    fn call(name: &str, arguments: Option<&str>) -> ToolCommand {
        ToolCommand::Call {
            name: name.into(),
            arguments: arguments.map(Into::into),
            raw: String::new(),
        }
    }

    #[test]
    fn descriptors_sorted_by_name() {
        let names: Vec<String> = registry().descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["broken", "echo"]);
    }

    #[tokio::test]
    async fn not_a_command_runs_nothing() {
        assert!(registry().execute(&ToolCommand::NotACommand, "m", "u").await.is_none());
    }

    #[tokio::test]
    async fn explicit_parameters_win_over_fallback() {
        let outcome = registry()
            .execute(&call("echo", Some("abc")), "user message", "u1")
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data, json!({ "echo": "abc", "user": "u1" }));
    }

    #[tokio::test]
    async fn missing_parameters_fall_back_to_message() {
        let outcome = registry()
            .execute(&call("echo", None), "user message", "u1")
            .await
            .unwrap();
        assert_eq!(outcome.data["echo"], "user message");
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failed_outcome() {
        let outcome = registry()
            .execute(&call("nope", Some("x")), "m", "u1")
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("nope"));
        assert!(matches!(
            registry().invoke("nope", "x", "u1").await,
            Err(ToolError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn execution_error_is_a_failed_outcome() {
        let outcome = registry()
            .execute(&call("broken", None), "m", "u1")
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("disk on fire"));
    }
}
