//! Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use structured_extractor::extraction::ExtractionMode;

/// Customer-support ticket triage backed by schema-validated LLM output.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Model id (overrides OPENAI_MODEL)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Per-command model timeout in seconds (overrides TRIAGE_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// The command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a message and print the plain-text answer
    Chat {
        /// Customer message
        message: String,
    },
    /// Produce a categorized reply
    Reply {
        /// Customer message
        message: String,
        /// How the schema is sent to the model
        #[arg(long, value_enum, default_value_t = ModeArg::Tool)]
        mode: ModeArg,
        /// Re-attempts after the first one (overrides TRIAGE_MAX_RETRIES)
        #[arg(long)]
        max_retries: Option<usize>,
    },
    /// Triage a ticket: reply, category, confidence and sentiment
    Ticket {
        /// Customer message
        message: String,
        /// Re-attempts after the first one (overrides TRIAGE_MAX_RETRIES)
        #[arg(long)]
        max_retries: Option<usize>,
    },
    /// Print the ticket JSON schema
    Schema,
}

/// `--mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Schema in the system prompt, JSON object response.
    Json,
    /// Forced function call.
    Tool,
}

impl From<ModeArg> for ExtractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Json => Self::Json,
            ModeArg::Tool => Self::Tool,
        }
    }
}
