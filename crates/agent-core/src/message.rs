//! Conversation Messages
//!
//! The conversation is an append-only log: it is the entire context sent to the
//! model on every turn, so nothing in it is ever edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::{ToolResultPayload, ToolUseRequest};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User input
    User,
    /// Assistant (model) output: text or a tool-use request
    Assistant,
    /// Result of a tool call
    ToolResult,
    /// An in-loop failure recorded for the model and the human
    SystemError,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::ToolResult => write!(f, "tool_result"),
            Self::SystemError => write!(f, "system_error"),
        }
    }
}

/// Message body
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: String,
    },
    ToolUse {
        request: ToolUseRequest,
    },
    ToolResult {
        tool_use_id: String,
        payload: ToolResultPayload,
    },
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    pub content: MessageContent,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text { text: text.into() })
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text { text: text.into() })
    }

    pub fn tool_use(request: ToolUseRequest) -> Self {
        Self::new(Role::Assistant, MessageContent::ToolUse { request })
    }

    pub fn tool_result(tool_use_id: impl Into<String>, payload: ToolResultPayload) -> Self {
        Self::new(
            Role::ToolResult,
            MessageContent::ToolResult {
                tool_use_id: tool_use_id.into(),
                payload,
            },
        )
    }

    pub fn system_error(text: impl Into<String>) -> Self {
        Self::new(Role::SystemError, MessageContent::Text { text: text.into() })
    }

    /// Text of a text message, `None` for tool traffic
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }

    /// True for a natural-language reply from the model
    pub fn is_assistant_reply(&self) -> bool {
        self.role == Role::Assistant && matches!(self.content, MessageContent::Text { .. })
    }
}

/// Append-only conversation log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether the log currently ends on a text reply from the model
    pub fn ends_with_assistant_reply(&self) -> bool {
        self.last().is_some_and(Message::is_assistant_reply)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
