//! Error types for extraction operations with attempt history tracking.

use std::time::Duration;
use thiserror::Error;

use super::metrics::ExtractionMetrics;
use crate::decode::DecodeError;
use crate::model::ModelError;
use crate::schema::{FieldViolation, ValidationError};

/// Record of a single failed extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// The attempt number (1-indexed).
    pub attempt_number: usize,
    /// Raw payload returned by the model (text or tool arguments).
    pub raw_output: String,
    /// Why the attempt failed.
    pub error: String,
    /// Elapsed time at the end of this attempt.
    pub elapsed: Duration,
}

/// Tag of an [`ExtractionError`], for callers that only need the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed serialization.
    Decode,
    /// Well-formed but schema-violating.
    Validation,
    /// Retry budget consumed.
    RetryExhausted,
    /// Collaborator-level failure.
    Transport,
    /// Caller-imposed deadline exceeded.
    Timeout,
}

/// Errors that can occur during extraction operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model output could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The decoded candidate violates the schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every allowed attempt failed to decode or validate.
    #[error("extraction failed after {attempts_made} retries (max: {max_retries}): {last_error}")]
    RetryExhausted {
        /// Retries performed after the first attempt.
        attempts_made: usize,
        /// Retry budget of the call.
        max_retries: usize,
        /// Failure of the final attempt.
        last_error: Box<ExtractionError>,
        /// Every failed attempt, in order.
        history: Vec<AttemptRecord>,
        /// Metrics tracked across all attempts.
        metrics: ExtractionMetrics,
    },

    /// The model call itself failed; never retried.
    #[error("model call failed: {0}")]
    Transport(#[from] ModelError),

    /// The whole extraction exceeded its time limit.
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
}

impl ExtractionError {
    /// Category of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Validation(_) => ErrorKind::Validation,
            Self::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// The innermost cause: the last attempt's error for `RetryExhausted`, else `self`.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::RetryExhausted { last_error, .. } => last_error.root(),
            other => other,
        }
    }

    /// Field violations of the root cause, if it was a validation failure.
    #[must_use]
    pub fn violations(&self) -> Option<&[FieldViolation]> {
        match self.root() {
            Self::Validation(error) => Some(&error.violations),
            _ => None,
        }
    }

    /// Whether the retry budget applies to this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ViolationReason;

    #[test]
    fn test_kind_and_root() {
        let validation = ValidationError {
            violations: vec![FieldViolation::new("category", ViolationReason::Missing)],
        };
        let exhausted = ExtractionError::RetryExhausted {
            attempts_made: 1,
            max_retries: 1,
            last_error: Box::new(validation.into()),
            history: Vec::new(),
            metrics: ExtractionMetrics::default(),
        };

        assert_eq!(exhausted.kind(), ErrorKind::RetryExhausted);
        assert_eq!(exhausted.root().kind(), ErrorKind::Validation);
        assert_eq!(exhausted.violations().map(<[_]>::len), Some(1));
        assert!(!exhausted.is_retryable());
        assert!(exhausted.to_string().contains("`category`: required field is missing"));
    }

    #[test]
    fn test_transport_is_not_retryable() {
        let err = ExtractionError::from(ModelError::Transport("connection reset".into()));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!err.is_retryable());
        assert!(err.violations().is_none());
    }
}
