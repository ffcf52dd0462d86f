//! Error types for the triage CLI.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while configuring or running a triage command.
#[derive(Debug, Error)]
pub enum AppError {
    /// No API key in the environment or `.env`.
    #[error("OPENAI_API_KEY is not set. Export it or add it to a .env file in the working directory")]
    MissingApiKey,

    /// An environment setting could not be parsed.
    #[error("invalid value `{value}` for {name}: {reason}")]
    InvalidSetting {
        /// Variable name.
        name: &'static str,
        /// Raw value found.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A built-in schema failed to build.
    #[error("schema error: {0}")]
    Schema(#[from] structured_extractor::schema::SchemaError),

    /// The extraction loop failed.
    #[error(transparent)]
    Extraction(#[from] structured_extractor::extraction::ExtractionError),

    /// A plain model call failed.
    #[error(transparent)]
    Model(#[from] structured_extractor::model::ModelError),

    /// A plain model call did not finish in time.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
}
