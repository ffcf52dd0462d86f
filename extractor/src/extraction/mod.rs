//! Extraction retry and validation loop.
//!
//! - [`StructuredExtractor`] - request/decode/validate loop with bounded retries
//! - [`ExtractionError`] - tagged failure with attempt history
//! - [`ExtractionMetrics`] - attempt count, timing and token estimates
//! - [`ExtractionConfig`] - mode, feedback strategy and timeout
//! - [`RetryState`] - per-call retry budget
//! - [`build_validation_feedback`] - correction messages for guided retries

pub mod config;
pub mod error;
pub mod feedback;
pub mod metrics;
pub mod orchestrator;
pub mod retry;

pub use config::{ExtractionConfig, ExtractionMode, FeedbackMode};
pub use error::{AttemptRecord, ErrorKind, ExtractionError};
pub use feedback::{build_parse_error_feedback, build_validation_feedback, feedback_turn};
pub use metrics::{chars_to_tokens, estimate_tokens, ExtractionMetrics, MetricsRecorder};
pub use orchestrator::StructuredExtractor;
pub use retry::RetryState;
