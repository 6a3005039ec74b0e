use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised while dispatching a user's turn.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("user '{0}' already has a request in flight; wait for it to complete")]
    Busy(String),

    #[error("message for user '{0}' is empty")]
    EmptyMessage(String),

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("invalid scenario: {0}")]
    InvalidScenario(#[from] ScenarioError),

    #[error("remote call failed: {0}")]
    Remote(#[from] LlmError),

    #[error("user task for '{user_id}' panicked: {message}")]
    TaskPanicked { user_id: String, message: String },
}

/// Errors from scenario validation and loading.
#[derive(Debug, Clone, Error)]
pub enum ScenarioError {
    #[error("scenario has no users")]
    NoUsers,

    #[error("user id must not be blank")]
    BlankUserId,

    #[error("user '{0}' has no messages")]
    EmptySequence(String),

    #[error("message {index} of user '{user_id}' is blank")]
    BlankMessage { user_id: String, index: usize },

    #[error("failed to read scenario: {0}")]
    Io(String),

    #[error("failed to parse scenario: {0}")]
    Parse(String),
}

/// Errors from tool lookup and execution.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("tool '{0}' is not available")]
    NotFound(String),

    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// Errors from the chatbot service.
#[derive(Debug, Clone, Error)]
pub enum ChatbotError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("remote call failed: {0}")]
    Remote(#[from] LlmError),
}
