//! Raw model responses and the response-format hint sent with each request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// Unprocessed output of one model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawResponse {
    /// Free text (possibly JSON).
    Text(String),
    /// A function/tool call with serialized arguments.
    ToolCall {
        /// Name of the called tool.
        name: String,
        /// Argument payload, serialized as JSON text.
        arguments: String,
    },
}

impl RawResponse {
    /// Creates a text response.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a tool-call response.
    #[must_use]
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::ToolCall {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// The payload that gets decoded: the text, or the tool-call arguments.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::ToolCall { arguments, .. } => arguments,
        }
    }

    /// Renders the response as assistant message content for feedback turns.
    #[must_use]
    pub fn as_assistant_content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::ToolCall { name, arguments } => {
                format!("Called `{name}` with arguments: {arguments}")
            }
        }
    }
}

/// A function/tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// What the tool is for.
    pub description: String,
    /// JSON Schema of the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Builds the tool whose arguments are exactly `schema`.
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        let description = schema.description().map_or_else(
            || format!("Respond with a `{}` object.", schema.name()),
            ToString::to_string,
        );
        Self {
            name: schema.name().to_string(),
            description,
            parameters: schema.to_json_schema(),
        }
    }
}

/// How the model is asked to shape its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Unconstrained text.
    Text,
    /// A JSON object matching `schema`.
    JsonObject {
        /// JSON Schema the object should satisfy.
        schema: Value,
    },
    /// A forced call of the given tool.
    Tool(ToolDefinition),
}

impl ResponseFormat {
    /// Name of the tool the model is expected to call, if any.
    #[must_use]
    pub fn expected_tool(&self) -> Option<&str> {
        match self {
            Self::Tool(definition) => Some(&definition.name),
            Self::Text | Self::JsonObject { .. } => None,
        }
    }
}
