//! The model-call collaborator seam.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::message::Conversation;
use crate::response::{RawResponse, ResponseFormat};

/// Transport-level failures of a model call.
///
/// These are never retried by the extractor: the retry budget is reserved
/// for schema-contract failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The provider could not be reached or rejected the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered without any text or tool call.
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Sends one conversation to a model and returns its raw output.
///
/// Implementations own the transport (HTTP client, credentials, model id).
#[async_trait]
pub trait ModelCall: Send + Sync {
    /// Performs a single completion request.
    async fn call(
        &self,
        conversation: &Conversation,
        format: &ResponseFormat,
    ) -> Result<RawResponse, ModelError>;
}

#[async_trait]
impl<T: ModelCall + ?Sized> ModelCall for Arc<T> {
    async fn call(
        &self,
        conversation: &Conversation,
        format: &ResponseFormat,
    ) -> Result<RawResponse, ModelError> {
        (**self).call(conversation, format).await
    }
}

#[async_trait]
impl<T: ModelCall + ?Sized> ModelCall for Box<T> {
    async fn call(
        &self,
        conversation: &Conversation,
        format: &ResponseFormat,
    ) -> Result<RawResponse, ModelError> {
        (**self).call(conversation, format).await
    }
}
