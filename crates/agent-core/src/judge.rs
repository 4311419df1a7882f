//! Completion Judge
//!
//! Asks the model whether the latest user request has been fully answered.
//! The judge instruction is added to a copy of the message list for this one
//! call and is never written back into the conversation.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};

pub const COMPLETION_CHECK_PROMPT: &str = r#"Review the conversation history and determine if the user's question has been completely answered.
If not completely answered, explain what's missing or needs clarification.
Follow this format:
1. First state "COMPLETE" or "INCOMPLETE"
2. Then briefly explain why

Focus only on the most recent user query and subsequent responses."#;

const INCOMPLETE_TOKEN: &str = "INCOMPLETE";

/// Outcome of a completion check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Complete { note: String },
    /// `note` is whatever followed the `INCOMPLETE` token
    Incomplete { note: String },
}

impl Verdict {
    /// Incomplete iff the literal `INCOMPLETE` appears; anything else is Complete.
    pub fn parse(response: &str) -> Self {
        response.find(INCOMPLETE_TOKEN).map_or_else(
            || Self::Complete {
                note: response.trim().to_string(),
            },
            |idx| Self::Incomplete {
                note: response[idx + INCOMPLETE_TOKEN.len()..].trim().to_string(),
            },
        )
    }

    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn note(&self) -> &str {
        match self {
            Self::Complete { note } | Self::Incomplete { note } => note,
        }
    }
}

pub struct CompletionJudge {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    instruction: String,
    options: GenerationOptions,
}

impl CompletionJudge {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            instruction: COMPLETION_CHECK_PROMPT.into(),
            options,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Classify the tail of the conversation. Tools are not offered to the model.
    pub async fn assess(&self, conversation: &Conversation) -> Result<Verdict> {
        let mut messages = conversation.messages().to_vec();
        messages.push(Message::user(self.instruction.as_str()));

        let response = self
            .provider
            .invoke(&messages, Some(self.system_prompt.as_str()), None, &self.options)
            .await
            .map_err(|e| AgentError::CompletionJudge(e.to_string()))?;

        let text = response.text();
        tracing::info!(response = %text, "Completion check");
        Ok(Verdict::parse(&text))
    }
}
