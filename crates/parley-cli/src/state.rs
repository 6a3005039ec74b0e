//! Application state shared by every command.
//!
//! Holds the loaded configuration and the boxed provider. Each command run
//! builds its own `RunContext`, so runs never share sessions or timelines.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use parley_core::chatbot::ChatbotService;
use parley_core::chatbot::builtin::builtin_registry;
use parley_core::dispatch::{Dispatcher, RunContext};
use parley_core::llm::box_provider::BoxResponsesProvider;
use parley_infra::config::load_config;
use parley_infra::llm::create_provider;
use parley_infra::secret::{load_dotenv, resolve_api_key};
use parley_types::config::ParleyConfig;

pub struct AppState {
    pub config: ParleyConfig,
    pub provider: Arc<BoxResponsesProvider>,
}

impl AppState {
    /// Load config and `.env`, resolve the API key and build the provider.
    pub async fn init(config_path: &Path, model_override: Option<&str>) -> anyhow::Result<Self> {
        let mut config = load_config(config_path).await;
        if let Some(model) = model_override {
            config.model = model.to_string();
        }

        load_dotenv();
        let api_key = resolve_api_key(&config.api_key_env)
            .context("No API key available for the responses service")?;
        let provider = create_provider(&config, api_key)
            .context("Failed to create the responses provider")?;

        tracing::debug!(model = %config.model, base_url = %config.base_url, "Application state ready");
        Ok(Self {
            config,
            provider: Arc::new(provider),
        })
    }

    /// Dispatcher over a fresh run context.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.provider.clone(), RunContext::new(), &self.config.model)
            .with_preview_chars(self.config.preview_chars)
    }

    /// Chatbot with the built-in tools over a fresh run context.
    pub fn chatbot(&self) -> ChatbotService {
        ChatbotService::new(
            self.provider.clone(),
            RunContext::new(),
            builtin_registry(),
            &self.config.model,
        )
        .with_max_output_tokens(self.config.max_output_tokens)
        .with_context_pairs_limit(self.config.context_pairs_limit)
        .with_preview_chars(self.config.preview_chars)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.config.sweep_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.idle_timeout_secs)
    }
}
