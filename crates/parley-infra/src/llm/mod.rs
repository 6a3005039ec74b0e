//! Responses provider implementations.
//!
//! [`create_provider`] builds the boxed provider the dispatcher and chatbot
//! share, from a [`ParleyConfig`] and an already resolved API key.

pub mod openai_responses;

use std::time::Duration;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxResponsesProvider;
use parley_types::config::ParleyConfig;
use parley_types::llm::LlmError;

use self::openai_responses::OpenAiResponsesProvider;

/// Create a [`BoxResponsesProvider`] for the configured endpoint.
pub fn create_provider(
    config: &ParleyConfig,
    api_key: SecretString,
) -> Result<BoxResponsesProvider, LlmError> {
    let provider =
        OpenAiResponsesProvider::new(api_key, Duration::from_secs(config.request_timeout_secs))?
            .with_base_url(config.base_url.as_str());
    tracing::debug!(base_url = %config.base_url, model = %config.model, "Created responses provider");
    Ok(BoxResponsesProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_from_default_config() {
        let provider =
            create_provider(&ParleyConfig::default(), SecretString::from("sk".to_string())).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
