//! Configuration loader for Parley.
//!
//! Reads a TOML file (normally `parley.toml` in the working directory) into
//! [`ParleyConfig`]. Falls back to defaults when the file is missing or
//! malformed.

use std::path::Path;

use parley_types::config::ParleyConfig;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "parley.toml";

/// Load configuration from `path`.
///
/// - Missing file: [`ParleyConfig::default()`].
/// - Unreadable or unparsable file: logs a warning, returns the default.
/// - Zero request timeout or sweep period: logs a warning, that field
///   takes its default.
pub async fn load_config(path: &Path) -> ParleyConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return ParleyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ParleyConfig::default();
        }
    };

    match toml::from_str::<ParleyConfig>(&content) {
        Ok(mut config) => {
            for field in config.replace_zero_periods() {
                tracing::warn!("{field} = 0 in {} is not usable, using the default", path.display());
            }
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            ParleyConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(DEFAULT_CONFIG_FILE)).await;
        assert_eq!(config, ParleyConfig::default());
    }

    #[tokio::test]
    async fn valid_toml_overrides_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(
            &path,
            r#"
model = "gpt-4o-mini"
base_url = "http://localhost:9000/v1"
context_pairs_limit = 3
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.context_pairs_limit, 3);
        assert_eq!(config.max_output_tokens, 4000);
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        assert_eq!(load_config(&path).await, ParleyConfig::default());
    }

    #[tokio::test]
    async fn zero_periods_are_replaced() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(&path, "request_timeout_secs = 0\nsweep_interval_secs = 0\nmodel = \"m\"\n")
            .await
            .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.model, "m");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.sweep_interval_secs, 60);
    }
}
