//! Per-call retry bookkeeping.

use super::error::ExtractionError;

/// Retry budget of a single `extract` call.
///
/// Created when the call starts, updated once per failed attempt and dropped
/// when the call returns.
#[derive(Debug)]
pub struct RetryState {
    attempts_made: usize,
    max_retries: usize,
    last_error: Option<ExtractionError>,
}

impl RetryState {
    /// Fresh state allowing `max_retries` re-attempts after the first one.
    #[must_use]
    pub const fn new(max_retries: usize) -> Self {
        Self {
            attempts_made: 0,
            max_retries,
            last_error: None,
        }
    }

    /// Retries performed so far.
    #[must_use]
    pub const fn attempts_made(&self) -> usize {
        self.attempts_made
    }

    /// Retry budget.
    #[must_use]
    pub const fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Total model calls allowed, first attempt included.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// 1-indexed number of the attempt currently in flight.
    #[must_use]
    pub const fn current_attempt(&self) -> usize {
        self.attempts_made + 1
    }

    /// Whether another attempt is allowed after a failure.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.attempts_made < self.max_retries
    }

    /// Error of the most recent failed attempt that was retried.
    #[must_use]
    pub const fn last_error(&self) -> Option<&ExtractionError> {
        self.last_error.as_ref()
    }

    /// Consumes one retry for `error`.
    ///
    /// Returns the error back when the budget is exhausted.
    pub fn retry_after(&mut self, error: ExtractionError) -> Result<(), ExtractionError> {
        if self.can_retry() {
            self.attempts_made += 1;
            self.last_error = Some(error);
            Ok(())
        } else {
            Err(error)
        }
    }
}
