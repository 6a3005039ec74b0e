//! Environment variable credentials.
//!
//! The API key is read from a named environment variable, after an optional
//! `.env` file in the working directory (or a parent) has been loaded.
//! Variables already set in the process environment win over `.env`.

use std::env::VarError;
use std::path::PathBuf;

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("environment variable {0} is not set (export it or add it to .env)")]
    Missing(String),

    #[error("environment variable {0} is empty")]
    Empty(String),

    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

/// Load `.env` into the process environment. Returns the file used, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(err) if err.not_found() => None,
        Err(err) => {
            tracing::warn!("Ignoring unreadable .env file: {err}");
            None
        }
    }
}

/// Read the API key from `var`.
pub fn resolve_api_key(var: &str) -> Result<SecretString, CredentialError> {
    key_from_lookup(var, std::env::var(var))
}

fn key_from_lookup(
    var: &str,
    lookup: Result<String, VarError>,
) -> Result<SecretString, CredentialError> {
    match lookup {
        Ok(value) if value.trim().is_empty() => Err(CredentialError::Empty(var.to_string())),
        Ok(value) => Ok(SecretString::from(value.trim().to_string())),
        Err(VarError::NotPresent) => Err(CredentialError::Missing(var.to_string())),
        Err(VarError::NotUnicode(_)) => Err(CredentialError::NotUnicode(var.to_string())),
    }
}
