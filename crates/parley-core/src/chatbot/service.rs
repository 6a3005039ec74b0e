//! Multi-user chatbot service.
//!
//! One `process_message` call handles one user message end to end: busy
//! check, prompt assembly, the remote call chained on the user's
//! continuation token, an optional tool round-trip, and the periodic
//! context reset. Different users run fully concurrently; one user's
//! messages are serialized by the busy guard.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parley_types::error::{ChatbotError, DispatchError};
use parley_types::llm::{InputMessage, LlmError, MessageRole, ResponseRequest};
use parley_types::timeline::excerpt;
use parley_types::tool::ToolCommand;

use super::command::parse_tool_command;
use super::prompt::{RECENT_INTERACTIONS, SystemPromptBuilder};
use super::tools::ToolRegistry;
use crate::dispatch::RunContext;
use crate::dispatch::exchange::{CallLabel, RecordedReply, call_recorded, new_correlation_id};
use crate::llm::box_provider::BoxResponsesProvider;
use crate::session::reaper::{ReaperHandle, spawn_idle_reaper};

/// Reply used when a requested tool is unknown or fails.
pub const TOOL_FAILURE_REPLY: &str =
    "I encountered an error while processing your request. Please try again.";

/// One user's message for [`ChatbotService::process_many`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

impl ChatRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
        }
    }
}

/// Tool-aware chatbot over a Responses-style provider.
///
/// Cheap to clone; every clone shares the same sessions, timeline and
/// in-flight registry.
#[derive(Debug, Clone)]
pub struct ChatbotService {
    provider: Arc<BoxResponsesProvider>,
    context: RunContext,
    tools: Arc<ToolRegistry>,
    prompt: Arc<SystemPromptBuilder>,
    model: String,
    max_output_tokens: Option<u32>,
    context_pairs_limit: u32,
    preview_chars: usize,
}

impl ChatbotService {
    /// The prompt lists every tool in `tools`.
    pub fn new(
        provider: Arc<BoxResponsesProvider>,
        context: RunContext,
        tools: ToolRegistry,
        model: impl Into<String>,
    ) -> Self {
        let prompt = SystemPromptBuilder::default().with_tools(tools.descriptors());
        Self {
            provider,
            context,
            tools: Arc::new(tools),
            prompt: Arc::new(prompt),
            model: model.into(),
            max_output_tokens: None,
            context_pairs_limit: 6,
            preview_chars: 200,
        }
    }

    /// Replace the base prompt. Tool descriptions are kept.
    pub fn with_base_prompt(mut self, base: impl Into<String>) -> Self {
        self.prompt = Arc::new(SystemPromptBuilder::new(base).with_tools(self.tools.descriptors()));
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Number of message pairs after which the remote conversation is
    /// restarted from a condensed history.
    pub fn with_context_pairs_limit(mut self, limit: u32) -> Self {
        self.context_pairs_limit = limit.max(1);
        self
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Number of users with a request in flight.
    pub fn active_count(&self) -> usize {
        self.context.active.active_count()
    }

    /// Start the idle reaper over this service's in-flight registry.
    pub fn spawn_reaper(
        &self,
        interval: Duration,
        idle_timeout: Duration,
        cancel: CancellationToken,
    ) -> ReaperHandle {
        spawn_idle_reaper(self.context.active.clone(), interval, idle_timeout, cancel)
    }

    fn request(&self, input: Vec<InputMessage>, previous: Option<String>) -> ResponseRequest {
        ResponseRequest {
            model: self.model.clone(),
            input,
            previous_response_id: previous,
            max_output_tokens: self.max_output_tokens,
        }
    }

    async fn call(
        &self,
        user_id: &str,
        correlation_id: &str,
        sent_text: &str,
        request: &ResponseRequest,
    ) -> Result<RecordedReply, LlmError> {
        call_recorded(
            &self.provider,
            &self.context.timeline,
            CallLabel {
                user_id,
                correlation_id,
                sent_text,
            },
            request,
            self.preview_chars,
        )
        .await
    }

    /// Handle one message for `user_id` and return the reply text.
    ///
    /// On error the user's session is left as it was before the call.
    pub async fn process_message(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<String, ChatbotError> {
        if user_id.trim().is_empty() {
            return Err(DispatchError::EmptyUserId.into());
        }
        if message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage(user_id.to_string()).into());
        }
        let _guard = self.context.active.try_acquire(user_id)?;

        info!(user_id, message = %excerpt(message, 100), "Starting request");
        let correlation_id = new_correlation_id();
        let session = self.context.sessions.session(user_id);
        let reset_after = session.pairs_since_reset >= self.context_pairs_limit - 1;
        let prompt = self.prompt.build(None, &session.interactions);

        let request = self.request(
            vec![InputMessage::developer(&prompt), InputMessage::user(message)],
            session.continuation.clone(),
        );
        let first = self
            .call(user_id, &correlation_id, message, &request)
            .await?
            .reply;
        if first.output_text.trim().is_empty() {
            return Err(LlmError::EmptyOutput.into());
        }

        let mut latest_id = first.id.clone();
        let reply = match parse_tool_command(&first.output_text) {
            ToolCommand::NotACommand => first.output_text,
            command @ ToolCommand::Call { .. } => {
                info!(user_id, correlation_id = %correlation_id, "Model requested a tool");
                let outcome = self.tools.execute(&command, message, user_id).await;
                match (outcome, &command) {
                    (Some(outcome), ToolCommand::Call { name, raw, .. }) if outcome.success => {
                        let results = serde_json::to_string_pretty(&outcome.data)
                            .unwrap_or_else(|_| outcome.data.to_string());
                        let followup = self.request(
                            vec![
                                InputMessage::developer(SystemPromptBuilder::tool_followup(
                                    &prompt, name,
                                )),
                                InputMessage::user(message),
                                InputMessage::assistant(raw.as_str()),
                                InputMessage::user(format!(
                                    "Tool Results: {results}\n\n\
                                    Based on these results, provide a helpful response to my original message."
                                )),
                            ],
                            Some(first.id.clone()),
                        );
                        let processed = self
                            .call(
                                user_id,
                                &new_correlation_id(),
                                &format!("tool result: {name}"),
                                &followup,
                            )
                            .await?
                            .reply;
                        latest_id = processed.id;
                        if processed.output_text.trim().is_empty() {
                            outcome.message
                        } else {
                            processed.output_text
                        }
                    }
                    _ => TOOL_FAILURE_REPLY.to_string(),
                }
            }
        };

        let (continuation, pairs_since_reset) = if reset_after {
            let fresh = self
                .reset_context(user_id, &prompt, &session.history, message, &reply)
                .await?;
            (fresh, 0)
        } else {
            (latest_id, session.pairs_since_reset + 1)
        };

        let history_window = self.history_window();
        self.context.sessions.update(user_id, |s| {
            s.continuation = Some(continuation);
            s.pairs_since_reset = pairs_since_reset;
            s.history.push(InputMessage::user(message));
            s.history.push(InputMessage::assistant(reply.as_str()));
            let excess = s.history.len().saturating_sub(history_window);
            s.history.drain(..excess);
            s.interactions.push(excerpt(message, 60));
            let excess = s.interactions.len().saturating_sub(RECENT_INTERACTIONS);
            s.interactions.drain(..excess);
        });

        info!(user_id, pairs_since_reset, "Completed request");
        Ok(reply)
    }

    /// Messages kept per user: enough to reseed a reset conversation.
    fn history_window(&self) -> usize {
        2 * (self.context_pairs_limit.saturating_sub(1) as usize)
    }

    /// Open a fresh remote conversation seeded with recent history plus the
    /// current exchange. Returns the new continuation token.
    async fn reset_context(
        &self,
        user_id: &str,
        prompt: &str,
        history: &[InputMessage],
        message: &str,
        reply: &str,
    ) -> Result<String, ChatbotError> {
        info!(user_id, "Creating new remote conversation (context reset)");
        let start = history.len().saturating_sub(self.history_window());
        let mut input = vec![InputMessage::developer(SystemPromptBuilder::context_reset(
            prompt,
        ))];
        input.extend(
            history[start..]
                .iter()
                .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
                .cloned()
                .chain([InputMessage::user(message), InputMessage::assistant(reply)])
                .filter(|m| !m.content.trim().is_empty()),
        );

        let request = self.request(input, None);
        let fresh = self
            .call(user_id, &new_correlation_id(), "context reset", &request)
            .await?
            .reply;
        debug!(user_id, response_id = %fresh.id, "New remote conversation created");
        Ok(fresh.id)
    }

    /// Process several users' messages concurrently.
    ///
    /// Returns one result per request, in input order. A second request for
    /// a user already being served in the same batch is rejected as busy.
    pub async fn process_many(
        &self,
        requests: Vec<ChatRequest>,
    ) -> Vec<Result<String, ChatbotError>> {
        info!(count = requests.len(), "Processing users concurrently");
        let total = requests.len();
        let mut set = JoinSet::new();
        let mut task_index = HashMap::new();
        for (index, request) in requests.into_iter().enumerate() {
            let this = self.clone();
            let handle = set.spawn(async move {
                this.process_message(&request.user_id, &request.message)
                    .await
            });
            task_index.insert(handle.id(), index);
        }

        let mut results: Vec<Option<Result<String, ChatbotError>>> =
            (0..total).map(|_| None).collect();
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    if let Some(&index) = task_index.get(&id) {
                        if let Err(err) = &result {
                            warn!(index, error = %err, "Request failed");
                        }
                        results[index] = Some(result);
                    }
                }
                Err(join_error) => {
                    if let Some(&index) = task_index.get(&join_error.id()) {
                        warn!(index, error = %join_error, "Request task panicked");
                        results[index] = Some(Err(DispatchError::TaskPanicked {
                            user_id: String::new(),
                            message: join_error.to_string(),
                        }
                        .into()));
                    }
                }
            }
        }

        info!(count = total, "All users processed");
        results
            .into_iter()
            .map(|r| {
                r.unwrap_or_else(|| {
                    Err(DispatchError::TaskPanicked {
                        user_id: String::new(),
                        message: "task result missing".into(),
                    }
                    .into())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::builtin::builtin_registry;
    use crate::llm::scripted::ScriptedProvider;
    use parley_types::timeline::EventKind;

    fn service(provider: ScriptedProvider) -> ChatbotService {
        ChatbotService::new(
            Arc::new(BoxResponsesProvider::new(provider)),
            RunContext::new(),
            builtin_registry(),
            "test-model",
        )
    }

    #[tokio::test]
    async fn plain_reply_updates_session() {
        let provider = ScriptedProvider::new();
        let handle = provider.clone();
        let bot = service(provider);

        let reply = bot.process_message("u1", "hello").await.unwrap();
        assert_eq!(reply, "echo: hello");

        let requests = handle.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].input[0].role, MessageRole::Developer);
        assert!(requests[0].input[0].content.contains("wordCount"));
        assert_eq!(requests[0].previous_response_id, None);

        let session = bot.context().sessions.session("u1");
        assert_eq!(session.continuation.as_deref(), Some("resp_1"));
        assert_eq!(session.pairs_since_reset, 1);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.interactions, vec!["hello".to_string()]);
        assert_eq!(bot.active_count(), 0);
    }

    #[tokio::test]
    async fn base_prompt_override_keeps_tool_list() {
        let provider = ScriptedProvider::new();
        let handle = provider.clone();
        let bot = service(provider).with_base_prompt("# ROLE: Support desk");

        bot.process_message("u1", "hi").await.unwrap();
        let developer = &handle.requests()[0].input[0].content;
        assert!(developer.starts_with("# ROLE: Support desk"));
        assert!(developer.contains("currentTime"));
    }

    #[tokio::test]
    async fn second_message_chains_on_first_reply() {
        let provider = ScriptedProvider::new();
        let handle = provider.clone();
        let bot = service(provider);

        bot.process_message("u1", "one").await.unwrap();
        bot.process_message("u1", "two").await.unwrap();

        let requests = handle.requests();
        assert_eq!(requests[1].previous_response_id.as_deref(), Some("resp_1"));
        assert!(requests[1].input[0].content.contains("RECENT INTERACTIONS: one"));
    }

    #[tokio::test]
    async fn tool_call_runs_tool_and_follow_up() {
        let provider = ScriptedProvider::new()
            .reply_on("count please", "Sure.\nTOOL_CALL:wordCount:one two three");
        let handle = provider.clone();
        let bot = service(provider);

        let reply = bot.process_message("u1", "count please").await.unwrap();
        assert!(reply.starts_with("echo: Tool Results:"));

        let requests = handle.requests();
        assert_eq!(requests.len(), 2);
        let followup = &requests[1];
        assert_eq!(followup.previous_response_id.as_deref(), Some("resp_1"));
        assert!(followup.input[0].content.contains("TOOL RESULT PROCESSING"));
        assert_eq!(followup.input[2].content, "TOOL_CALL:wordCount:one two three");
        assert!(followup.input[3].content.contains("\"words\": 3"));

        // Continuation follows the follow-up reply, not the tool request.
        assert_eq!(
            bot.context().sessions.get("u1").as_deref(),
            Some("resp_2")
        );
        assert_eq!(bot.context().timeline.count(EventKind::Send, Some("u1")), 2);
    }

    #[tokio::test]
    async fn each_remote_call_gets_its_own_correlation_id() {
        let provider = ScriptedProvider::new().reply_on("what time", "TOOL_CALL:currentTime");
        let handle = provider.clone();
        // A limit of one resets after every message: first call, tool
        // follow-up and reset all go out for the same user message.
        let bot = service(provider).with_context_pairs_limit(1);

        bot.process_message("u1", "what time").await.unwrap();
        assert_eq!(handle.requests().len(), 3);

        let entries = bot.context().timeline.entries_for("u1");
        let ids_of = |kind: EventKind| -> Vec<String> {
            entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.correlation_id.clone())
                .collect()
        };
        let mut sends = ids_of(EventKind::Send);
        let mut receives = ids_of(EventKind::Receive);
        sends.sort();
        receives.sort();
        assert_eq!(sends, receives);
        receives.dedup();
        assert_eq!(receives.len(), 3);
    }

    #[tokio::test]
    async fn unknown_tool_returns_apology_without_follow_up() {
        let provider = ScriptedProvider::new().reply_on("hm", "TOOL_CALL:teleport:mars");
        let handle = provider.clone();
        let bot = service(provider);

        let reply = bot.process_message("u1", "hm").await.unwrap();
        assert_eq!(reply, TOOL_FAILURE_REPLY);
        assert_eq!(handle.requests().len(), 1);
        assert_eq!(bot.context().sessions.get("u1").as_deref(), Some("resp_1"));
    }

    #[tokio::test]
    async fn context_resets_after_limit() {
        let provider = ScriptedProvider::new();
        let handle = provider.clone();
        let bot = service(provider).with_context_pairs_limit(2);

        bot.process_message("u1", "m1").await.unwrap();
        assert_eq!(bot.context().sessions.session("u1").pairs_since_reset, 1);

        bot.process_message("u1", "m2").await.unwrap();
        let requests = handle.requests();
        assert_eq!(requests.len(), 3);

        let reset = &requests[2];
        assert_eq!(reset.previous_response_id, None);
        assert!(reset.input[0].content.ends_with("Continuing from recent conversation."));
        let seeded: Vec<&str> = reset.input[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(seeded, vec!["m1", "echo: m1", "m2", "echo: m2"]);

        let session = bot.context().sessions.session("u1");
        assert_eq!(session.pairs_since_reset, 0);
        assert_eq!(session.continuation.as_deref(), Some("resp_3"));

        // The next message chains on the fresh conversation.
        bot.process_message("u1", "m3").await.unwrap();
        assert_eq!(
            handle.requests()[3].previous_response_id.as_deref(),
            Some("resp_3")
        );
    }

    #[tokio::test]
    async fn busy_user_is_rejected() {
        let provider = ScriptedProvider::new().delay_on("slow", Duration::from_millis(200));
        let bot = service(provider);

        let first = {
            let bot = bot.clone();
            tokio::spawn(async move { bot.process_message("u1", "slow").await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(bot.active_count(), 1);

        let err = bot.process_message("u1", "again").await.unwrap_err();
        assert!(matches!(err, ChatbotError::Dispatch(DispatchError::Busy(_))));

        first.await.unwrap().unwrap();
        assert_eq!(bot.active_count(), 0);
    }

    #[tokio::test]
    async fn failure_releases_user_and_keeps_session() {
        let provider = ScriptedProvider::new().fail_on("boom", "service down");
        let bot = service(provider);

        bot.process_message("u1", "ok").await.unwrap();
        let before = bot.context().sessions.session("u1");

        let err = bot.process_message("u1", "boom").await.unwrap_err();
        assert!(matches!(err, ChatbotError::Remote(_)));
        assert_eq!(bot.active_count(), 0);
        assert_eq!(bot.context().sessions.session("u1"), before);
    }

    #[tokio::test]
    async fn empty_output_is_an_error() {
        let bot = service(ScriptedProvider::new().reply_on("blank", "   "));
        let err = bot.process_message("u1", "blank").await.unwrap_err();
        assert!(matches!(err, ChatbotError::Remote(LlmError::EmptyOutput)));
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let bot = service(ScriptedProvider::new());
        assert!(matches!(
            bot.process_message("u1", " ").await,
            Err(ChatbotError::Dispatch(DispatchError::EmptyMessage(_)))
        ));
        assert!(matches!(
            bot.process_message("", "hi").await,
            Err(ChatbotError::Dispatch(DispatchError::EmptyUserId))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn process_many_keeps_input_order() {
        let provider = ScriptedProvider::new()
            .delay_on("first", Duration::from_millis(80))
            .delay_on("second", Duration::from_millis(10))
            .fail_on("third", "nope");
        let handle = provider.clone();
        let bot = service(provider);

        let results = bot
            .process_many(vec![
                ChatRequest::new("user1", "first"),
                ChatRequest::new("user2", "second"),
                ChatRequest::new("user3", "third"),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_deref().unwrap(), "echo: first");
        assert_eq!(results[1].as_deref().unwrap(), "echo: second");
        assert!(results[2].is_err());
        assert!(handle.peak_in_flight() >= 2);
        assert_eq!(bot.active_count(), 0);
    }
}
