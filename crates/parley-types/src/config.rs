//! Configuration types for Parley.
//!
//! `ParleyConfig` represents the `parley.toml` that selects the model, the
//! service endpoint, excerpt sizes and the chatbot/reaper timings.

use serde::{Deserialize, Serialize};

/// Top-level configuration. Every field has a default, so an empty file
/// (or no file at all) yields a working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the responses service (without the `/responses` path).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// `max_output_tokens` for chatbot requests.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// HTTP timeout for one remote call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Characters of reply text kept in timeline entries.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Chatbot: start a fresh remote conversation every N message pairs.
    #[serde(default = "default_context_pairs_limit")]
    pub context_pairs_limit: u32,

    /// Reaper: active-request markers older than this are dropped.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Reaper: sweep period.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_output_tokens() -> u32 {
    4_000
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_preview_chars() -> usize {
    200
}

fn default_context_pairs_limit() -> u32 {
    6
}

fn default_idle_timeout_secs() -> u64 {
    5 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            preview_chars: default_preview_chars(),
            context_pairs_limit: default_context_pairs_limit(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl ParleyConfig {
    /// Replace zero periods that cannot work (an instant HTTP timeout, a
    /// zero sweep period) with their defaults. Returns the names of the
    /// fields that were replaced.
    pub fn replace_zero_periods(&mut self) -> Vec<&'static str> {
        let mut replaced = Vec::new();
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
            replaced.push("request_timeout_secs");
        }
        if self.sweep_interval_secs == 0 {
            self.sweep_interval_secs = default_sweep_interval_secs();
            replaced.push("sweep_interval_secs");
        }
        replaced
    }
}
