//! Scripted LLM Provider
//!
//! For tests and demos. Replays queued responses in order and records what each
//! call was given.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{ContentBlock, GenerationOptions, LlmProvider, ModelResponse};
use crate::tool::{ToolDescriptor, ToolUseRequest};

/// A recorded call
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub system: Option<String>,
    pub tools_offered: bool,
    pub tool_names: Vec<String>,
}

#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ModelResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_response(&self, response: ModelResponse) {
        self.responses.lock().await.push_back(Ok(response));
    }

    pub async fn push_text(&self, text: impl Into<String>) {
        self.push_response(ModelResponse::from_blocks(vec![ContentBlock::Text {
            text: text.into(),
        }]))
        .await;
    }

    pub async fn push_tool_use(&self, request: ToolUseRequest) {
        self.push_response(ModelResponse::from_blocks(vec![ContentBlock::ToolUse(request)]))
            .await;
    }

    pub async fn push_error(&self, error: AgentError) {
        self.responses.lock().await.push_back(Err(error));
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn invoke(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: Option<&[ToolDescriptor]>,
        _options: &GenerationOptions,
    ) -> Result<ModelResponse> {
        self.requests.lock().await.push(RecordedRequest {
            messages: messages.to_vec(),
            system: system.map(str::to_string),
            tools_offered: tools.is_some(),
            tool_names: tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        });

        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::ModelApi("script exhausted".into())))
    }
}
