//! Decoding raw model output into candidate JSON objects.

use serde_json::Value;
use thiserror::Error;

use crate::response::RawResponse;

/// Raw output that could not be turned into a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not decode model output: {message}")]
pub struct DecodeError {
    /// What went wrong.
    pub message: String,
    /// The offending payload.
    pub raw: String,
}

impl DecodeError {
    fn new(message: impl Into<String>, raw: &str) -> Self {
        Self {
            message: message.into(),
            raw: raw.to_string(),
        }
    }
}

/// Decodes a raw response into a candidate JSON object.
///
/// Text is trimmed and unwrapped from a single surrounding markdown code
/// fence before parsing. Tool-call arguments are parsed the same way; when
/// `expected_tool` is set, a call to any other tool is a decode failure.
pub fn decode(raw: &RawResponse, expected_tool: Option<&str>) -> Result<Value, DecodeError> {
    match raw {
        RawResponse::Text(text) => parse_object(text),
        RawResponse::ToolCall { name, arguments } => {
            if let Some(expected) = expected_tool {
                if name != expected {
                    return Err(DecodeError::new(
                        format!("expected a call to `{expected}`, got `{name}`"),
                        arguments,
                    ));
                }
            }
            parse_object(arguments)
        }
    }
}

fn parse_object(payload: &str) -> Result<Value, DecodeError> {
    let body = strip_code_fence(payload);
    if body.is_empty() {
        return Err(DecodeError::new("response is empty", payload));
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| DecodeError::new(e.to_string(), payload))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(DecodeError::new("expected a JSON object", payload))
    }
}

/// Strips one surrounding ```` ``` ```` fence (with optional language tag).
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // drop the language tag line
    body.split_once('\n').map_or(body, |(_, body)| body).trim()
}
