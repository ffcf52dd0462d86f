//! Orchestration layer for the request/decode/validate/retry loop.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::config::{ExtractionConfig, ExtractionMode, FeedbackMode};
use super::error::{AttemptRecord, ExtractionError};
use super::feedback::feedback_turn;
use super::metrics::{ExtractionMetrics, MetricsRecorder};
use super::retry::RetryState;
use crate::decode::{decode, DecodeError};
use crate::message::Conversation;
use crate::model::ModelCall;
use crate::response::{RawResponse, ResponseFormat, ToolDefinition};
use crate::schema::{FieldViolation, Schema, SchemaInstance, ValidationError, ViolationReason};

/// Business rule applied to one field after schema validation.
type FieldRule = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

struct FieldCheck {
    field: String,
    rule: FieldRule,
}

/// Obtains schema-conformant output from a model, retrying on contract failures.
///
/// Each call to [`extract`](Self::extract) sends the conversation with a
/// schema-derived directive, decodes the answer, validates it and, on a
/// decode or validation failure, retries until the budget runs out.
/// Transport failures and timeouts end the call immediately.
pub struct StructuredExtractor<M> {
    model: M,
    config: ExtractionConfig,
    checks: Vec<FieldCheck>,
}

impl<M: ModelCall> StructuredExtractor<M> {
    /// Creates an extractor with the default configuration.
    #[must_use]
    pub fn new(model: M) -> Self {
        Self::with_config(model, ExtractionConfig::default())
    }

    /// Creates an extractor with the given configuration.
    #[must_use]
    pub const fn with_config(model: M, config: ExtractionConfig) -> Self {
        Self {
            model,
            config,
            checks: Vec::new(),
        }
    }

    /// Sets how the schema reaches the model (fluent builder pattern).
    #[must_use]
    pub const fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets the retry strategy.
    #[must_use]
    pub const fn feedback(mut self, feedback: FeedbackMode) -> Self {
        self.config.feedback = feedback;
        self
    }

    /// Sets a wall-clock limit for each `extract` call.
    #[must_use]
    pub const fn timeout(mut self, limit: Duration) -> Self {
        self.config.timeout = Some(limit);
        self
    }

    /// Adds a rule for `field`, run after schema validation succeeds.
    ///
    /// A rejection is reported as a validation failure of that field and is
    /// retried like any other. Absent optional fields are not checked.
    #[must_use]
    pub fn check<F>(mut self, field: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.checks.push(FieldCheck {
            field: field.into(),
            rule: Arc::new(rule),
        });
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// The model-call collaborator.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Runs the extraction loop.
    ///
    /// `max_retries` is the number of re-attempts after the first one; `0`
    /// means exactly one model call.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::RetryExhausted` when every attempt failed to decode
    ///   or validate; it wraps the last attempt's error.
    /// - `ExtractionError::Transport` as soon as a model call fails.
    /// - `ExtractionError::Timeout` when the configured limit elapses.
    pub async fn extract(
        &self,
        conversation: Conversation,
        schema: &Schema,
        max_retries: usize,
    ) -> Result<(SchemaInstance, ExtractionMetrics), ExtractionError> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(conversation, schema, max_retries))
                .await
                .unwrap_or_else(|_| {
                    warn!(schema = schema.name(), ?limit, "extraction timed out");
                    Err(ExtractionError::Timeout(limit))
                }),
            None => self.run(conversation, schema, max_retries).await,
        }
    }

    /// Extracts and deserializes the validated instance into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`extract`](Self::extract), plus `ExtractionError::Decode` if
    /// the validated instance does not deserialize into `T`.
    pub async fn extract_typed<T: DeserializeOwned>(
        &self,
        conversation: Conversation,
        schema: &Schema,
        max_retries: usize,
    ) -> Result<(T, ExtractionMetrics), ExtractionError> {
        let (instance, metrics) = self.extract(conversation, schema, max_retries).await?;

        let typed = instance.deserialize().map_err(|e| {
            let raw = instance.clone().into_value().to_string();
            ExtractionError::Decode(DecodeError {
                message: format!("deserialization to target type failed: {e}"),
                raw,
            })
        })?;

        Ok((typed, metrics))
    }

    async fn run(
        &self,
        conversation: Conversation,
        schema: &Schema,
        max_retries: usize,
    ) -> Result<(SchemaInstance, ExtractionMetrics), ExtractionError> {
        let mut recorder = MetricsRecorder::start();
        let (mut conversation, format) = self.prepare(conversation, schema);
        let mut retry = RetryState::new(max_retries);
        let mut history: Vec<AttemptRecord> = Vec::new();

        loop {
            let attempt = retry.current_attempt();
            let max_attempts = retry.max_attempts();
            debug!(
                schema = schema.name(),
                attempt,
                max_attempts,
                messages = conversation.len(),
                "requesting structured output"
            );

            recorder.record_request(&conversation);
            let raw = self
                .model
                .call(&conversation, &format)
                .await
                .map_err(|e| {
                    warn!(schema = schema.name(), attempt, error = %e, "model call failed, not retrying");
                    ExtractionError::Transport(e)
                })?;
            recorder.record_response(&raw);

            let failure = match self.evaluate(&raw, schema, format.expected_tool()) {
                Ok(instance) => {
                    info!(schema = schema.name(), attempts = attempt, "extraction succeeded");
                    return Ok((instance, recorder.snapshot()));
                }
                Err(failure) => failure,
            };

            warn!(
                schema = schema.name(),
                attempt,
                max_attempts,
                kind = ?failure.kind(),
                error = %failure,
                "attempt failed"
            );
            history.push(AttemptRecord {
                attempt_number: attempt,
                raw_output: raw.payload().to_string(),
                error: failure.to_string(),
                elapsed: recorder.elapsed(),
            });

            if self.config.feedback == FeedbackMode::Guided && retry.can_retry() {
                let turn = feedback_turn(
                    &raw,
                    &failure,
                    schema,
                    self.config.include_schema_in_feedback,
                    attempt,
                    max_attempts,
                );
                for message in turn {
                    conversation.push(message);
                }
            }

            if let Err(last_error) = retry.retry_after(failure) {
                error!(
                    schema = schema.name(),
                    attempts = attempt,
                    "retry budget exhausted"
                );
                let metrics = recorder.snapshot();
                return Err(ExtractionError::RetryExhausted {
                    attempts_made: retry.attempts_made(),
                    max_retries: retry.max_retries(),
                    last_error: Box::new(last_error),
                    history,
                    metrics,
                });
            }
        }
    }

    /// Adds the schema directive to the conversation and picks the response format.
    fn prepare(&self, conversation: Conversation, schema: &Schema) -> (Conversation, ResponseFormat) {
        match self.config.mode {
            ExtractionMode::Json => (
                conversation.with_system_instruction(&schema.instruction()),
                ResponseFormat::JsonObject {
                    schema: schema.to_json_schema(),
                },
            ),
            ExtractionMode::Tool => {
                let tool = ToolDefinition::from_schema(schema);
                let instruction = format!(
                    "Always answer by calling the `{}` function with arguments that satisfy its parameter schema.",
                    tool.name
                );
                (
                    conversation.with_system_instruction(&instruction),
                    ResponseFormat::Tool(tool),
                )
            }
        }
    }

    /// Decodes, validates and applies field checks to one raw response.
    fn evaluate(
        &self,
        raw: &RawResponse,
        schema: &Schema,
        expected_tool: Option<&str>,
    ) -> Result<SchemaInstance, ExtractionError> {
        let candidate = decode(raw, expected_tool)?;
        let instance = schema.validate(&candidate)?;

        let violations: Vec<FieldViolation> = self
            .checks
            .iter()
            .filter_map(|check| {
                let value = instance.get(&check.field)?;
                (check.rule)(value)
                    .err()
                    .map(|reason| FieldViolation::new(&check.field, ViolationReason::Rejected(reason)))
            })
            .collect();

        if violations.is_empty() {
            Ok(instance)
        } else {
            Err(ValidationError { violations }.into())
        }
    }
}
