//! Scripted model for testing.
//!
//! [`ScriptedModel`] replays a queue of predefined responses and failures and
//! records every request it receives, so retry behavior can be tested
//! without network access.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::message::Conversation;
use crate::model::{ModelCall, ModelError};
use crate::response::{RawResponse, ResponseFormat};

#[derive(Debug, Clone)]
enum Step {
    Respond(RawResponse),
    Fail(ModelError),
    Hang,
}

/// A request observed by [`ScriptedModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Conversation as sent.
    pub conversation: Conversation,
    /// Response-format hint as sent.
    pub format: ResponseFormat,
}

/// A model that answers from a script.
///
/// Steps are consumed in order. The final step repeats once the script runs
/// out, so a single failing response can stand for "always fails".
///
/// # Example
///
/// ```
/// use structured_extractor::mock::ScriptedModel;
///
/// let model = ScriptedModel::new()
///     .respond_text("not json")
///     .respond_text(r#"{"content": "ok"}"#);
/// assert_eq!(model.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    /// Creates a model with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a text response.
    #[must_use]
    pub fn respond_text(self, text: impl Into<String>) -> Self {
        self.push(Step::Respond(RawResponse::text(text)))
    }

    /// Queues a tool-call response.
    #[must_use]
    pub fn respond_tool(self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        self.push(Step::Respond(RawResponse::tool_call(name, arguments)))
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn fail(self, error: ModelError) -> Self {
        self.push(Step::Fail(error))
    }

    /// Queues a call that never completes.
    #[must_use]
    pub fn hang(self) -> Self {
        self.push(Step::Hang)
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, step: Step) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
        self
    }

    fn next_step(&self) -> Option<Step> {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl ModelCall for ScriptedModel {
    async fn call(
        &self,
        conversation: &Conversation,
        format: &ResponseFormat,
    ) -> Result<RawResponse, ModelError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                conversation: conversation.clone(),
                format: format.clone(),
            });

        match self.next_step() {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(ModelError::Transport("script is empty".into())),
        }
    }
}
