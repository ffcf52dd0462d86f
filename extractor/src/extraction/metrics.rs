//! Per-call accounting: model calls, wall time and token estimates.
//!
//! Token counts are estimates (four characters per token, rounded up) taken
//! over the running character totals, so rounding happens once per call
//! rather than once per attempt.

use std::time::Duration;
use tokio::time::Instant;

use crate::message::Conversation;
use crate::response::RawResponse;

const CHARS_PER_TOKEN: usize = 4;

/// What one `extract` call cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionMetrics {
    /// Model calls made, first attempt included.
    pub total_attempts: usize,
    /// Time from the start of the call to its result.
    pub wall_time: Duration,
    /// Estimated tokens sent, summed over every attempt's full conversation.
    pub estimated_input_tokens: usize,
    /// Estimated tokens received, summed over every attempt's payload.
    pub estimated_output_tokens: usize,
}

/// Estimated token count of `text`.
///
/// ```
/// use structured_extractor::extraction::estimate_tokens;
///
/// assert_eq!(estimate_tokens("hello"), 2);
/// assert_eq!(estimate_tokens("你好"), 1);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    chars_to_tokens(text.chars().count())
}

/// Converts a character count into estimated tokens.
#[must_use]
pub const fn chars_to_tokens(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Running totals for one `extract` call.
#[derive(Debug)]
pub struct MetricsRecorder {
    started: Instant,
    calls: usize,
    input_chars: usize,
    output_chars: usize,
}

impl MetricsRecorder {
    /// Starts the clock.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            calls: 0,
            input_chars: 0,
            output_chars: 0,
        }
    }

    /// Counts one model call carrying `conversation`.
    pub fn record_request(&mut self, conversation: &Conversation) {
        self.calls += 1;
        self.input_chars += conversation.char_count();
    }

    /// Counts the payload of one response.
    pub fn record_response(&mut self, response: &RawResponse) {
        self.output_chars += response.payload().chars().count();
    }

    /// Time since [`start`](Self::start).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Snapshot of the totals so far.
    #[must_use]
    pub fn snapshot(&self) -> ExtractionMetrics {
        ExtractionMetrics {
            total_attempts: self.calls,
            wall_time: self.elapsed(),
            estimated_input_tokens: chars_to_tokens(self.input_chars),
            estimated_output_tokens: chars_to_tokens(self.output_chars),
        }
    }
}
