//! Schema-validated structured extraction from chat models.
//!
//! This crate obtains structured output from a chat-completion model: it sends
//! a conversation together with a schema directive, decodes the answer,
//! validates it against an explicit [`Schema`](schema::Schema) and retries with
//! feedback until the answer conforms or the retry budget runs out.
//!
//! The model itself sits behind the [`ModelCall`](model::ModelCall) trait, so
//! any provider (or the [`ScriptedModel`](mock::ScriptedModel) used in tests)
//! can drive the loop.
//!
//! ## Example
//!
//! ```
//! use structured_extractor::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::builder("reply")
//!     .field(Field::string("content"))
//!     .field(Field::enumeration("category", ["general", "order", "billing"]))
//!     .build()?;
//!
//! let model = ScriptedModel::new()
//!     .respond_tool("reply", r#"{"content": "ok", "category": "banana"}"#)
//!     .respond_tool("reply", r#"{"content": "ok", "category": "billing"}"#);
//!
//! let extractor = StructuredExtractor::new(model);
//! let conversation = Conversation::from_prompt(
//!     "You're a helpful customer care assistant.",
//!     "I have a question about my bill.",
//! );
//! let (reply, metrics) = extractor.extract(conversation, &schema, 1).await?;
//!
//! assert_eq!(reply.str("category"), Some("billing"));
//! assert_eq!(metrics.total_attempts, 2);
//! # Ok(())
//! # }
//! ```

pub mod decode;
pub mod extraction;
pub mod message;
pub mod mock;
pub mod model;
pub mod response;
pub mod schema;

/// Common imports for building and running extractions.
pub mod prelude {
    pub use crate::extraction::{
        ErrorKind, ExtractionConfig, ExtractionError, ExtractionMetrics, ExtractionMode,
        FeedbackMode, StructuredExtractor,
    };
    pub use crate::message::{Conversation, Message, Role};
    pub use crate::mock::ScriptedModel;
    pub use crate::model::{ModelCall, ModelError};
    pub use crate::response::{RawResponse, ResponseFormat, ToolDefinition};
    pub use crate::schema::{Field, FieldType, Schema, SchemaInstance, ValidationError};
}
