//! Request/response types for the hosted responses service.
//!
//! These types model one remote call: the input messages, the optional
//! continuation token (`previous_response_id`) that chains the call onto an
//! earlier reply, and the reply carrying a fresh continuation token.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an input message.
///
/// `Developer` carries instructions (the system prompt); the service ranks it
/// above user content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Developer,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::Developer => write!(f, "developer"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "developer" | "system" => Ok(MessageRole::Developer),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single input message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: MessageRole,
    pub content: String,
}

impl InputMessage {
    pub fn developer(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Developer,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to the responses service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    /// Continuation token of the reply this request follows up on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl ResponseRequest {
    /// A request carrying a single user message.
    pub fn user_text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: vec![InputMessage::user(text)],
            previous_response_id: None,
            max_output_tokens: None,
        }
    }

    /// Chain this request onto an earlier reply.
    pub fn continuing(mut self, previous_response_id: Option<String>) -> Self {
        self.previous_response_id = previous_response_id;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Reply from the responses service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseReply {
    /// Continuation token for the next request in the same conversation.
    pub id: String,
    /// Concatenated output text.
    pub output_text: String,
    pub model: String,
    /// Request id assigned by the service's edge (`x-request-id`), if exposed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

/// Token usage for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from responses service calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("response contained no output text")]
    EmptyOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_display_roundtrip() {
        for role in [
            MessageRole::Developer,
            MessageRole::User,
            MessageRole::Assistant,
        ] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_system_role_parses_as_developer() {
        assert_eq!("System".parse::<MessageRole>().unwrap(), MessageRole::Developer);
        assert!("tool".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_request_omits_absent_continuation() {
        let req = ResponseRequest::user_text("gpt-4.1-mini", "hi");
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("previous_response_id").is_none());
        assert!(json.get("max_output_tokens").is_none());
        assert_eq!(json["input"][0]["role"], "user");
    }

    #[test]
    fn test_request_continuing_sets_token() {
        let req = ResponseRequest::user_text("m", "hi")
            .continuing(Some("resp_1".to_string()))
            .with_max_output_tokens(100);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["previous_response_id"], "resp_1");
        assert_eq!(json["max_output_tokens"], 100);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::RateLimited {
            retry_after_ms: Some(500),
        };
        assert!(err.to_string().contains("500"));
        assert_eq!(
            LlmError::EmptyOutput.to_string(),
            "response contained no output text"
        );
    }
}
