//! API credential resolution.

pub mod env;

pub use env::{CredentialError, load_dotenv, resolve_api_key};
