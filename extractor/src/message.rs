//! Chat messages and the append-only conversation sent to the model.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Output of a tool invocation.
    Tool,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl Message {
    /// Creates a message with the given role.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a tool message.
    #[must_use]
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }
}

/// Errors raised when constructing a [`Conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// No messages were supplied.
    #[error("a conversation needs at least one message")]
    Empty,
}

/// Ordered, non-empty list of messages.
///
/// Messages can be appended but never removed or edited, so every retry sees
/// the full history of earlier attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates a conversation from a non-empty list of messages.
    pub fn new(messages: Vec<Message>) -> Result<Self, ConversationError> {
        if messages.is_empty() {
            return Err(ConversationError::Empty);
        }
        Ok(Self { messages })
    }

    /// Creates the usual system-then-user conversation.
    #[must_use]
    pub fn from_prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Iterates over the messages in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Number of messages (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`: conversations are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Total number of characters across all message contents.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }

    /// Returns a copy whose leading system message carries `instruction`.
    ///
    /// The instruction is appended to an existing leading system message, or
    /// inserted as a new one when the conversation starts with another role.
    #[must_use]
    pub fn with_system_instruction(&self, instruction: &str) -> Self {
        let mut messages = self.messages.clone();
        match messages.first_mut() {
            Some(first) if first.role == Role::System => {
                if !first.content.is_empty() {
                    first.content.push_str("\n\n");
                }
                first.content.push_str(instruction);
            }
            _ => messages.insert(0, Message::system(instruction)),
        }
        Self { messages }
    }
}

impl TryFrom<Vec<Message>> for Conversation {
    type Error = ConversationError;

    fn try_from(messages: Vec<Message>) -> Result<Self, Self::Error> {
        Self::new(messages)
    }
}

impl From<Conversation> for Vec<Message> {
    fn from(conversation: Conversation) -> Self {
        conversation.messages
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_conversation_rejected() {
        assert_eq!(Conversation::new(vec![]), Err(ConversationError::Empty));
        assert!(serde_json::from_str::<Conversation>("[]").is_err());
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let conversation = Conversation::from_prompt("Be helpful", "Hi");
        let json = serde_json::to_value(&conversation).unwrap();

        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[1]["role"], "user");
        assert_eq!(json[1]["content"], "Hi");

        let back: Conversation = serde_json::from_value(json).unwrap();
        assert_eq!(back, conversation);
    }

    #[test]
    fn test_system_instruction_appended_to_leading_system() {
        let conversation = Conversation::from_prompt("Be helpful", "Hi");
        let instructed = conversation.with_system_instruction("Answer in JSON");

        assert_eq!(instructed.len(), 2);
        assert_eq!(instructed.messages()[0].content, "Be helpful\n\nAnswer in JSON");
        // original untouched
        assert_eq!(conversation.messages()[0].content, "Be helpful");
    }

    #[test]
    fn test_system_instruction_inserted_when_missing() {
        let conversation = Conversation::new(vec![Message::user("Hi")]).unwrap();
        let instructed = conversation.with_system_instruction("Answer in JSON");

        assert_eq!(instructed.len(), 2);
        assert_eq!(instructed.messages()[0], Message::system("Answer in JSON"));
        assert_eq!(instructed.messages()[1], Message::user("Hi"));
    }

    #[test]
    fn test_push_appends() {
        let mut conversation = Conversation::from_prompt("s", "u");
        conversation.push(Message::assistant("a"));
        assert_eq!(conversation.last().map(|m| m.role), Some(Role::Assistant));
        assert_eq!(conversation.char_count(), 3);
    }
}
