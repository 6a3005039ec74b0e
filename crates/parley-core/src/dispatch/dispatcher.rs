//! Request dispatcher.
//!
//! `Dispatcher` runs a [`Scenario`]: one tokio task per user, all spawned
//! together into a `JoinSet` and awaited jointly. Inside a task the user's
//! messages go out strictly one after another, each chained on the
//! continuation token the previous reply returned. A failed turn ends that
//! user's sequence and nobody else's.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use parley_types::error::{DispatchError, ScenarioError};
use parley_types::llm::ResponseRequest;
use parley_types::scenario::Scenario;
use parley_types::timeline::FinalizedEntry;
use parley_types::turn::{TurnFailure, TurnRecord, TurnState, UserOutcome};

use super::context::RunContext;
use super::exchange::{CallLabel, call_recorded, new_correlation_id};
use crate::llm::box_provider::BoxResponsesProvider;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One outcome per user, ordered by user id.
    pub outcomes: Vec<UserOutcome>,
    /// Timeline sorted by timestamp with elapsed offsets.
    pub timeline: Vec<FinalizedEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Wall-clock duration of the whole run in seconds.
    pub fn total_seconds(&self) -> f64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0
    }

    pub fn outcome(&self, user_id: &str) -> Option<&UserOutcome> {
        self.outcomes.iter().find(|o| o.user_id == user_id)
    }

    pub fn failed_users(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.failure.is_some())
            .map(|o| o.user_id.as_str())
            .collect()
    }
}

/// Drives per-user turn sequences against a shared provider.
///
/// Cheap to clone: the provider is behind an `Arc` and the run context is
/// `Arc`-backed, so each user task gets its own handle.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    provider: Arc<BoxResponsesProvider>,
    context: RunContext,
    model: String,
    preview_chars: usize,
    max_output_tokens: Option<u32>,
    roster: Option<Arc<HashSet<String>>>,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<BoxResponsesProvider>,
        context: RunContext,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            context,
            model: model.into(),
            preview_chars: 200,
            max_output_tokens: None,
            roster: None,
        }
    }

    /// Characters of reply text kept in `receive` entries.
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Restrict dispatch to a known set of users; anyone else is rejected
    /// with `UnknownUser` before any request is sent.
    pub fn with_roster<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roster = Some(Arc::new(users.into_iter().map(Into::into).collect()));
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    fn check_user(&self, user_id: &str) -> Result<(), DispatchError> {
        if user_id.trim().is_empty() {
            return Err(DispatchError::EmptyUserId);
        }
        if let Some(roster) = &self.roster {
            if !roster.contains(user_id) {
                return Err(DispatchError::UnknownUser(user_id.to_string()));
            }
        }
        Ok(())
    }

    /// Send one message for `user_id`, chained on the user's current token.
    ///
    /// Returns `Busy` immediately if the user already has a request in flight.
    pub async fn send_message(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<TurnRecord, DispatchError> {
        self.check_user(user_id)?;
        let correlation_id = new_correlation_id();
        self.execute_turn(user_id, message, &correlation_id).await
    }

    async fn execute_turn(
        &self,
        user_id: &str,
        message: &str,
        correlation_id: &str,
    ) -> Result<TurnRecord, DispatchError> {
        if message.trim().is_empty() {
            return Err(DispatchError::EmptyMessage(user_id.to_string()));
        }
        let _guard = self.context.active.try_acquire(user_id)?;
        let mut state = TurnState::Pending;

        let previous = self.context.sessions.get(user_id);
        let mut request =
            ResponseRequest::user_text(&self.model, message).continuing(previous.clone());
        if let Some(max) = self.max_output_tokens {
            request = request.with_max_output_tokens(max);
        }

        advance(&mut state, TurnState::Sent, correlation_id);
        let result = call_recorded(
            &self.provider,
            &self.context.timeline,
            CallLabel {
                user_id,
                correlation_id,
                sent_text: message,
            },
            &request,
            self.preview_chars,
        )
        .await;
        let recorded = match result {
            Ok(recorded) => recorded,
            Err(err) => {
                advance(&mut state, TurnState::Failed, correlation_id);
                return Err(err.into());
            }
        };

        self.context.sessions.set(user_id, recorded.reply.id.clone());
        advance(&mut state, TurnState::Completed, correlation_id);

        Ok(TurnRecord {
            user_id: user_id.to_string(),
            correlation_id: correlation_id.to_string(),
            message: message.to_string(),
            previous_response_id: previous,
            response_id: recorded.reply.id,
            request_id: recorded.reply.request_id,
            text: recorded.reply.output_text,
            sent_at: recorded.sent_at,
            received_at: recorded.received_at,
        })
    }

    /// Run one user's messages in order, stopping at the first failure.
    ///
    /// The user id and every message are checked first; invalid input
    /// sends nothing.
    pub async fn run_user(
        &self,
        user_id: String,
        messages: Vec<String>,
    ) -> Result<UserOutcome, DispatchError> {
        self.check_user(&user_id)?;
        if messages.is_empty() {
            return Err(ScenarioError::EmptySequence(user_id).into());
        }
        if let Some(index) = messages.iter().position(|m| m.trim().is_empty()) {
            return Err(ScenarioError::BlankMessage { user_id, index }.into());
        }
        Ok(self.run_sequence(user_id, messages).await)
    }

    async fn run_sequence(&self, user_id: String, messages: Vec<String>) -> UserOutcome {
        let planned = messages.len();
        let mut turns = Vec::with_capacity(planned);
        let mut failure = None;

        for (index, message) in messages.into_iter().enumerate() {
            let correlation_id = new_correlation_id();
            match self.execute_turn(&user_id, &message, &correlation_id).await {
                Ok(turn) => turns.push(turn),
                Err(err) => {
                    warn!(
                        user_id = %user_id,
                        turn = index,
                        remaining = planned - index - 1,
                        error = %err,
                        "Turn failed, abandoning remaining turns"
                    );
                    failure = Some(TurnFailure {
                        correlation_id,
                        message,
                        index,
                        error: err.to_string(),
                    });
                    break;
                }
            }
        }

        debug!(user_id = %user_id, completed = turns.len(), planned, "User sequence finished");
        UserOutcome {
            user_id,
            turns,
            failure,
            planned,
        }
    }

    /// Run every user of `scenario` concurrently and collect the results.
    ///
    /// The whole scenario is validated first; an invalid scenario sends
    /// nothing. A panicking user task is reported as that user's failure.
    pub async fn dispatch(&self, scenario: &Scenario) -> Result<RunReport, DispatchError> {
        scenario.validate()?;
        for user_id in scenario.users.keys() {
            self.check_user(user_id)?;
        }

        info!(
            users = scenario.user_count(),
            messages = scenario.message_count(),
            model = %self.model,
            "Dispatching scenario"
        );
        let started_at = Utc::now();

        let mut set: JoinSet<UserOutcome> = JoinSet::new();
        let mut task_users = HashMap::new();
        for (user_id, messages) in &scenario.users {
            let this = self.clone();
            let user = user_id.clone();
            let messages = messages.clone();
            let handle = set.spawn(async move { this.run_sequence(user, messages).await });
            task_users.insert(handle.id(), user_id.clone());
        }

        let mut outcomes = Vec::with_capacity(task_users.len());
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(join_error) => {
                    let user_id = task_users
                        .get(&join_error.id())
                        .cloned()
                        .unwrap_or_default();
                    warn!(user_id = %user_id, error = %join_error, "User task panicked");
                    let err = DispatchError::TaskPanicked {
                        user_id: user_id.clone(),
                        message: join_error.to_string(),
                    };
                    let planned = scenario.users.get(&user_id).map_or(0, Vec::len);
                    outcomes.push(UserOutcome {
                        user_id,
                        turns: Vec::new(),
                        failure: Some(TurnFailure {
                            correlation_id: String::new(),
                            message: String::new(),
                            index: 0,
                            error: err.to_string(),
                        }),
                        planned,
                    });
                }
            }
        }
        outcomes.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        let finished_at = Utc::now();
        let report = RunReport {
            outcomes,
            timeline: self.context.timeline.finalize(),
            started_at,
            finished_at,
        };
        info!(
            seconds = report.total_seconds(),
            failed_users = report.failed_users().len(),
            "Scenario finished"
        );
        Ok(report)
    }
}

fn advance(state: &mut TurnState, next: TurnState, correlation_id: &str) {
    debug_assert!(state.can_transition_to(next), "{state} -> {next}");
    trace!(correlation_id, from = %state, to = %next, "Turn state");
    *state = next;
}
