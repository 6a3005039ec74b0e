//! CLI command definitions for the `parley` binary.

pub mod chat;
pub mod render;
pub mod sequential;
pub mod stress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use parley_core::chatbot::ChatRequest;

/// Per-user sequential, cross-user concurrent conversations against the
/// OpenAI Responses API.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed logs (-v for request events, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Configuration file.
    #[arg(long, global = true, env = "PARLEY_CONFIG", default_value = "parley.toml")]
    pub config: PathBuf,

    /// Override the configured model.
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run many users concurrently, each sending its messages in order, and
    /// print the merged timeline.
    Stress {
        /// Scenario TOML file (`[users] id = ["msg", ...]`). Defaults to the
        /// built-in six-user demo.
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Write the finished run (timeline and per-user results) as JSON.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Send one user's messages in order and check that each was sent only
    /// after the previous reply arrived.
    #[command(alias = "seq")]
    Sequential {
        /// User id the messages belong to.
        #[arg(long, default_value = "a1")]
        user: String,

        /// Number of messages to prompt for when none are given.
        #[arg(long, default_value_t = 3)]
        count: usize,

        /// Messages to send. Prompted for interactively when omitted.
        messages: Vec<String>,
    },

    /// Send one message per user through the tool-aware chatbot, all users
    /// concurrently.
    Chat {
        /// Requests as `user=message`. Defaults to a three-user demo.
        #[arg(value_parser = chat::parse_chat_request)]
        requests: Vec<ChatRequest>,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}
