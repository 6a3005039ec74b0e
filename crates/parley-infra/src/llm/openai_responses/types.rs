//! Wire types for the OpenAI Responses API (`POST /responses`).
//!
//! Only the fields Parley sends or reads are modelled; unknown fields in
//! responses are ignored.

use serde::{Deserialize, Serialize};

use parley_types::llm::MessageRole;

/// Request body.
#[derive(Debug, Serialize)]
pub struct ResponsesRequestBody<'a> {
    pub model: &'a str,
    pub input: Vec<InputItem<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// One `input` message.
#[derive(Debug, Serialize)]
pub struct InputItem<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub role: MessageRole,
    pub content: &'a str,
}

/// Successful response body.
#[derive(Debug, Deserialize)]
pub struct ResponsesResponseBody {
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<ResponsesUsage>,
}

impl ResponsesResponseBody {
    /// Text of the first `output_text` (or `text`) block of the first
    /// `message` item; empty if there is none.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .find(|block| matches!(block.kind.as_str(), "output_text" | "text"))
            .and_then(|block| block.text.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsesUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}
