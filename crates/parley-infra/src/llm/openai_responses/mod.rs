//! OpenAiResponsesProvider -- [`ResponsesProvider`] for the OpenAI Responses API.
//!
//! Sends `POST {base_url}/responses` with bearer authentication. Conversation
//! state lives on the server: each request names the `previous_response_id`
//! it continues from, and the reply's `id` is the token for the next one.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::ResponsesProvider;
use parley_types::llm::{LlmError, ResponseReply, ResponseRequest, Usage};

use self::types::{ErrorEnvelope, InputItem, ResponsesRequestBody, ResponsesResponseBody};

/// Header carrying the service's internal request id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// OpenAI Responses API provider.
pub struct OpenAiResponsesProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiResponsesProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Create a provider with the given per-request timeout.
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (proxies, compatible gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    fn to_body<'a>(request: &'a ResponseRequest) -> ResponsesRequestBody<'a> {
        ResponsesRequestBody {
            model: &request.model,
            input: request
                .input
                .iter()
                .map(|m| InputItem {
                    kind: "message",
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            previous_response_id: request.previous_response_id.as_deref(),
            max_output_tokens: request.max_output_tokens,
        }
    }

    fn map_status(status: reqwest::StatusCode, retry_after: Option<u64>, body: &str) -> LlmError {
        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| match e.error.kind {
                Some(kind) => format!("{kind}: {}", e.error.message),
                None => e.error.message,
            })
            .unwrap_or_else(|_| body.to_string());

        match status.as_u16() {
            401 => LlmError::AuthenticationFailed,
            429 => LlmError::RateLimited {
                retry_after_ms: retry_after.map(|s| s.saturating_mul(1000)),
            },
            503 | 529 => LlmError::Overloaded(detail),
            _ => LlmError::Provider {
                message: format!("HTTP {status}: {detail}"),
            },
        }
    }
}

// No Debug impl: keeps the client and key out of any formatted output.

impl ResponsesProvider for OpenAiResponsesProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn respond(&self, request: &ResponseRequest) -> Result<ResponseReply, LlmError> {
        let body = Self::to_body(request);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, request_id = request_id.as_deref().unwrap_or("-"), "Responses API error");
            return Err(Self::map_status(status, retry_after, &error_body));
        }

        let parsed: ResponsesResponseBody = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let output_text = parsed.output_text();
        let usage = parsed
            .usage
            .as_ref()
            .map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            })
            .unwrap_or_default();
        let model = if parsed.model.is_empty() {
            request.model.clone()
        } else {
            parsed.model
        };

        Ok(ResponseReply {
            id: parsed.id,
            output_text,
            model,
            request_id,
            usage,
        })
    }
}
