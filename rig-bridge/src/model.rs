//! [`ModelCall`] implementation over a Rig completion model.

use async_trait::async_trait;
use rig::completion::message::ToolChoice;
use rig::completion::CompletionModel;
use structured_extractor::message::Conversation;
use structured_extractor::model::{ModelCall, ModelError};
use structured_extractor::response::{RawResponse, ResponseFormat};
use tracing::debug;

use crate::request::{first_output, json_mode_params, to_rig_request, to_rig_tool};

/// A Rig completion model usable as an extraction collaborator.
///
/// Tool hints attach the schema's tool definition and require the model to
/// call it. JSON-object hints ask the provider for a JSON-object response
/// through `response_format`, which Chat Completions style providers honor.
#[derive(Clone)]
pub struct RigModel<M> {
    model: M,
}

impl<M> RigModel<M> {
    /// Wraps a Rig completion model.
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    /// The wrapped model.
    pub const fn inner(&self) -> &M {
        &self.model
    }
}

#[async_trait]
impl<M> ModelCall for RigModel<M>
where
    M: CompletionModel + Send + Sync,
{
    async fn call(
        &self,
        conversation: &Conversation,
        format: &ResponseFormat,
    ) -> Result<RawResponse, ModelError> {
        let request = to_rig_request(conversation);
        debug!(
            history = request.history.len(),
            has_preamble = request.preamble.is_some(),
            tool = format.expected_tool(),
            "sending completion request"
        );

        let mut builder = self
            .model
            .completion_request(request.prompt)
            .messages(request.history);
        if let Some(preamble) = request.preamble {
            builder = builder.preamble(preamble);
        }
        match format {
            ResponseFormat::Tool(tool) => {
                // the only attached tool, so `Required` forces this one
                builder = builder
                    .tool(to_rig_tool(tool))
                    .tool_choice(ToolChoice::Required);
            }
            ResponseFormat::JsonObject { .. } => {
                builder = builder.additional_params(json_mode_params());
            }
            ResponseFormat::Text => {}
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        first_output(response.choice, format.expected_tool().is_some())
    }
}
