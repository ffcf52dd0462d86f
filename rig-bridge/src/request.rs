//! Mapping between extractor conversations and Rig requests and responses.

use rig::completion::message::{AssistantContent, Message as RigMessage};
use rig::completion::ToolDefinition as RigToolDefinition;
use rig::OneOrMany;
use serde_json::{json, Value};
use structured_extractor::message::{Conversation, Role};
use structured_extractor::model::ModelError;
use structured_extractor::response::{RawResponse, ToolDefinition};

/// A conversation split the way Rig's request builder expects it.
#[derive(Debug, Clone, PartialEq)]
pub struct RigRequest {
    /// Leading system messages, joined.
    pub preamble: Option<String>,
    /// Everything between the preamble and the prompt.
    pub history: Vec<RigMessage>,
    /// The final message.
    pub prompt: RigMessage,
}

/// Splits a conversation into preamble, history and prompt.
///
/// Leading system messages form the preamble. Rig has no tool or mid-thread
/// system role, so those are sent as user text with a role prefix.
#[must_use]
pub fn to_rig_request(conversation: &Conversation) -> RigRequest {
    let messages = conversation.messages();
    let Some((last, rest)) = messages.split_last() else {
        return RigRequest {
            preamble: None,
            history: Vec::new(),
            prompt: RigMessage::user(String::new()),
        };
    };

    let leading = rest
        .iter()
        .take_while(|m| m.role == Role::System)
        .count();
    let preamble = (leading > 0).then(|| {
        rest[..leading]
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    });

    let history = rest[leading..].iter().map(to_rig_message).collect();

    RigRequest {
        preamble,
        history,
        prompt: to_rig_message(last),
    }
}

fn to_rig_message(message: &structured_extractor::message::Message) -> RigMessage {
    match message.role {
        Role::User => RigMessage::user(message.content.clone()),
        Role::Assistant => RigMessage::assistant(message.content.clone()),
        Role::System | Role::Tool => {
            RigMessage::user(format!("[{}] {}", message.role, message.content))
        }
    }
}

/// Converts a schema tool definition into Rig's.
#[must_use]
pub fn to_rig_tool(tool: &ToolDefinition) -> RigToolDefinition {
    RigToolDefinition {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.parameters.clone(),
    }
}

/// Provider parameters requesting a JSON-object response.
#[must_use]
pub fn json_mode_params() -> Value {
    json!({ "response_format": { "type": "json_object" } })
}

/// Picks the output the extractor should see from a Rig choice.
///
/// With `prefer_tool` set, a tool call wins over text that precedes it.
/// Blank text and other content kinds are skipped.
pub fn first_output(
    choice: OneOrMany<AssistantContent>,
    prefer_tool: bool,
) -> Result<RawResponse, ModelError> {
    let mut text: Option<String> = None;

    for content in choice {
        match content {
            AssistantContent::ToolCall(call) => {
                return Ok(RawResponse::tool_call(
                    call.function.name,
                    call.function.arguments.to_string(),
                ));
            }
            AssistantContent::Text(t) if !t.text.trim().is_empty() => {
                if !prefer_tool {
                    return Ok(RawResponse::Text(t.text));
                }
                text.get_or_insert(t.text);
            }
            _ => {}
        }
    }

    text.map(RawResponse::Text).ok_or(ModelError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use structured_extractor::message::Message;

    #[test]
    fn test_system_messages_become_preamble() {
        let conversation = Conversation::new(vec![
            Message::system("You're a helpful customer care assistant."),
            Message::system("Answer in JSON."),
            Message::user("Where is my order?"),
            Message::assistant("{\"content\": 1}"),
            Message::user("Fix the errors."),
        ])
        .unwrap();

        let request = to_rig_request(&conversation);

        assert_eq!(
            request.preamble.as_deref(),
            Some("You're a helpful customer care assistant.\n\nAnswer in JSON.")
        );
        assert_eq!(
            request.history,
            vec![
                RigMessage::user("Where is my order?"),
                RigMessage::assistant("{\"content\": 1}"),
            ]
        );
        assert_eq!(request.prompt, RigMessage::user("Fix the errors."));
    }

    #[test]
    fn test_tool_and_late_system_messages_are_user_text() {
        let conversation = Conversation::new(vec![
            Message::user("hi"),
            Message::tool("{\"status\": \"shipped\"}"),
            Message::system("be brief"),
        ])
        .unwrap();

        let request = to_rig_request(&conversation);

        assert!(request.preamble.is_none());
        assert_eq!(
            request.history,
            vec![
                RigMessage::user("hi"),
                RigMessage::user("[tool] {\"status\": \"shipped\"}"),
            ]
        );
        assert_eq!(request.prompt, RigMessage::user("[system] be brief"));
    }

    #[test]
    fn test_single_system_message_is_the_prompt() {
        let conversation = Conversation::new(vec![Message::system("ping")]).unwrap();
        let request = to_rig_request(&conversation);
        assert!(request.preamble.is_none());
        assert!(request.history.is_empty());
        assert_eq!(request.prompt, RigMessage::user("[system] ping"));
    }

    #[test]
    fn test_first_output_text() {
        let choice = OneOrMany::one(AssistantContent::text("{\"a\": 1}"));
        assert_eq!(
            first_output(choice, false).unwrap(),
            RawResponse::text("{\"a\": 1}")
        );
    }

    #[test]
    fn test_first_output_prefers_tool_call() {
        let choice = OneOrMany::many(vec![
            AssistantContent::text("Let me call the tool."),
            AssistantContent::tool_call("call_1", "reply", serde_json::json!({"content": "ok"})),
        ])
        .unwrap();

        let output = first_output(choice, true).unwrap();
        assert_eq!(output, RawResponse::tool_call("reply", r#"{"content":"ok"}"#));
    }

    #[test]
    fn test_blank_text_is_empty_response() {
        let choice = OneOrMany::one(AssistantContent::text("   "));
        assert_eq!(first_output(choice, false), Err(ModelError::EmptyResponse));
    }
}
