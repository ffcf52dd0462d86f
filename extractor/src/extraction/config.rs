//! Configuration for extraction retry behavior.

use std::time::Duration;

/// How the schema is communicated to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Schema instruction embedded in the system prompt; the answer is JSON text.
    Json,
    /// Schema passed as a forced tool definition; the tool-call arguments are decoded.
    #[default]
    Tool,
}

/// What happens to the conversation between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedbackMode {
    /// Append the failed output and a description of the failure.
    #[default]
    Guided,
    /// Resend the unchanged conversation.
    Blind,
}

/// Configuration for extraction retry behavior.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// How the schema reaches the model (default: [`ExtractionMode::Tool`]).
    pub mode: ExtractionMode,
    /// Retry strategy (default: [`FeedbackMode::Guided`]).
    pub feedback: FeedbackMode,
    /// Whether to include the full schema in validation feedback (default: true).
    pub include_schema_in_feedback: bool,
    /// Wall-clock limit for a whole `extract` call (default: none).
    pub timeout: Option<Duration>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            feedback: FeedbackMode::default(),
            include_schema_in_feedback: true,
            timeout: None,
        }
    }
}

impl ExtractionConfig {
    /// Set how the schema is communicated to the model.
    #[must_use]
    pub const fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the retry strategy.
    #[must_use]
    pub const fn with_feedback(mut self, feedback: FeedbackMode) -> Self {
        self.feedback = feedback;
        self
    }

    /// Set whether to include the schema in validation feedback.
    #[must_use]
    pub const fn with_schema_in_feedback(mut self, include: bool) -> Self {
        self.include_schema_in_feedback = include;
        self
    }

    /// Set a wall-clock limit for the whole extraction.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
