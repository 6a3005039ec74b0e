//! Developer prompt assembly for the chatbot.
//!
//! Layout:
//! ```text
//! {base prompt}
//!
//! # TOOLS & INSTRUCTIONS:
//! ... numbered tool list ...
//!
//! # CURRENT SESSION CONTEXT:
//! {context or "No specific context available."}
//! RECENT INTERACTIONS: a → b → c
//!
//! # TOOL USAGE REMINDER:
//! ...
//! ```

use parley_types::tool::{TOOL_CALL_PREFIX, ToolDescriptor};

/// Number of past interactions echoed back to the model.
pub const RECENT_INTERACTIONS: usize = 3;

pub const DEFAULT_BASE_PROMPT: &str = "# ROLE: Parley assistant\n\n\
You are a concise, friendly assistant talking to one user at a time.\n\
Answer directly and keep replies short unless asked for detail.";

const NO_CONTEXT: &str = "No specific context available.";

/// Builds the developer message sent ahead of each user message.
#[derive(Debug, Clone)]
pub struct SystemPromptBuilder {
    base: String,
    tools: Vec<ToolDescriptor>,
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PROMPT)
    }
}

impl SystemPromptBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    /// Full developer prompt for one turn.
    ///
    /// `context` is free-form per-session data; `interactions` is the user's
    /// interaction log, of which only the last [`RECENT_INTERACTIONS`] are
    /// shown.
    pub fn build(&self, context: Option<&str>, interactions: &[String]) -> String {
        let mut sections = Vec::with_capacity(4);
        sections.push(self.base.trim().to_string());

        if !self.tools.is_empty() {
            let list: Vec<String> = self
                .tools
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{}. {} - {}", i + 1, t.name, t.description))
                .collect();
            sections.push(format!(
                "# TOOLS & INSTRUCTIONS:\n\
                You have access to the following tools. To use a tool, respond EXACTLY with:\n\
                {TOOL_CALL_PREFIX}tool_name:parameters\n\n\
                Available tools:\n{}",
                list.join("\n")
            ));
        }

        let context = context
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(NO_CONTEXT);
        let mut session = format!("# CURRENT SESSION CONTEXT:\nCURRENT CONTEXT: {context}");
        let start = interactions.len().saturating_sub(RECENT_INTERACTIONS);
        if start < interactions.len() {
            session.push_str("\nRECENT INTERACTIONS: ");
            session.push_str(&interactions[start..].join(" → "));
        }
        sections.push(session);

        sections.push(format!(
            "# TOOL USAGE REMINDER:\n\
            - Call tools EXACTLY: {TOOL_CALL_PREFIX}tool_name:parameters\n\
            - Wait for tool results before continuing\n\
            - Format tool responses appropriately"
        ));

        sections.join("\n\n")
    }

    /// Prompt for the follow-up call that turns a tool result into a reply.
    pub fn tool_followup(prompt: &str, tool_name: &str) -> String {
        format!(
            "{prompt}\n\nTOOL RESULT PROCESSING: The tool \"{tool_name}\" returned results.\n\
            Now provide a helpful response to the user based on these results."
        )
    }

    /// Prompt for the call that opens a fresh remote conversation.
    pub fn context_reset(prompt: &str) -> String {
        format!("{prompt}\n\nCONTEXT: Continuing from recent conversation.")
    }
}
