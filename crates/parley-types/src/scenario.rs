//! Multi-user scenarios: which users send which messages, in which order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// Map of user id to that user's ordered messages.
///
/// Users are kept in a `BTreeMap` so runs and reports list them in a stable
/// order; the order has no effect on scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub users: BTreeMap<String, Vec<String>>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_user<I, S>(mut self, user_id: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users
            .insert(user_id.into(), messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn message_count(&self) -> usize {
        self.users.values().map(Vec::len).sum()
    }

    /// Reject empty scenarios, blank user ids, empty sequences and blank messages.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.users.is_empty() {
            return Err(ScenarioError::NoUsers);
        }
        for (user_id, messages) in &self.users {
            if user_id.trim().is_empty() {
                return Err(ScenarioError::BlankUserId);
            }
            if messages.is_empty() {
                return Err(ScenarioError::EmptySequence(user_id.clone()));
            }
            if let Some(index) = messages.iter().position(|m| m.trim().is_empty()) {
                return Err(ScenarioError::BlankMessage {
                    user_id: user_id.clone(),
                    index,
                });
            }
        }
        Ok(())
    }

    /// Six users with three prompts each, of deliberately uneven length, so
    /// that replies come back interleaved.
    pub fn demo() -> Self {
        Self::new()
            .with_user(
                "a1",
                [
                    "Where is the Taj Mahal?",
                    "Where is the Eiffel Tower?",
                    "Confirm both locations again.",
                ],
            )
            .with_user(
                "b2",
                [
                    "Write a 100 word story.",
                    "Convert it into a 100 word poem.",
                    "Write the next part (100 words).",
                ],
            )
            .with_user(
                "c3",
                [
                    "Hello",
                    "How does a diesel engine work? (500 words)",
                    "Summarize in 200 words.",
                ],
            )
            .with_user(
                "d4",
                [
                    "What is Python?",
                    "Explain Python's GIL in 200 words.",
                    "Give a short coding example.",
                ],
            )
            .with_user(
                "e5",
                [
                    "What is a black hole?",
                    "Explain gravitational lensing in 100 words.",
                    "Name the four fundamental forces.",
                ],
            )
            .with_user(
                "f6",
                [
                    "Say Hi",
                    "Write a 250 word motivational speech.",
                    "Translate the speech into French.",
                ],
            )
    }
}
