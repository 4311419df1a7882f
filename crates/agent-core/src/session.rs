//! Chat Session
//!
//! The state that lives for one interactive run: the conversation log and the
//! loop guard. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::LoopGuard;
use crate::message::{Conversation, Message};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,

    conversation: Conversation,

    pub guard: LoopGuard,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub active: bool,
}

impl ChatSession {
    pub fn new(max_loops: u32) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            conversation: Conversation::new(),
            guard: LoopGuard::new(max_loops),
            created_at: now,
            updated_at: now,
            active: true,
        }
    }

    /// The only way messages enter the log
    pub fn append(&mut self, message: Message) {
        self.conversation.push(message);
        self.touch();
    }

    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn end(&mut self) {
        self.active = false;
        self.touch();
    }

    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = ChatSession::new(20);
        assert!(session.active);
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.guard.max(), 20);
    }

    #[test]
    fn test_append_and_end() {
        let mut session = ChatSession::new(5);
        session.append(Message::user("hi"));
        session.end();
        assert!(!session.active);
        assert_eq!(session.message_count(), 1);
        assert!(session.updated_at >= session.created_at);
    }
}
