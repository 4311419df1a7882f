//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` over the Messages API.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, MessageContent, Role},
    provider::{
        ContentBlock, FinishReason, GenerationOptions, LlmProvider, ModelResponse, TokenUsage,
    },
    tool::{ResultContent, ToolDescriptor, ToolResultPayload, ToolUseRequest},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_key: String,

    /// API base URL, without trailing slash
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Convert the conversation to wire messages.
    ///
    /// Tool results and system errors travel as user turns. Adjacent messages
    /// with the same wire role are merged into one turn.
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        let mut wire: Vec<WireMessage> = Vec::new();

        for message in messages {
            let (role, block) = match (&message.role, &message.content) {
                (Role::User, MessageContent::Text { text }) => ("user", WireBlock::Text { text: text.clone() }),
                (Role::SystemError, MessageContent::Text { text }) => (
                    "user",
                    WireBlock::Text {
                        text: format!("[system error] {text}"),
                    },
                ),
                (_, MessageContent::Text { text }) => ("assistant", WireBlock::Text { text: text.clone() }),
                (_, MessageContent::ToolUse { request }) => ("assistant", Self::tool_use_block(request)),
                (_, MessageContent::ToolResult { tool_use_id, payload }) => {
                    ("user", Self::tool_result_block(tool_use_id, payload))
                }
            };

            match wire.last_mut() {
                Some(last) if last.role == role => last.content.push(block),
                _ => wire.push(WireMessage {
                    role,
                    content: vec![block],
                }),
            }
        }

        // A final assistant turn is a prefill and may not end in whitespace
        if let Some(last) = wire.last_mut().filter(|m| m.role == "assistant") {
            if let Some(WireBlock::Text { text }) = last.content.last_mut() {
                let trimmed = text.trim_end().len();
                text.truncate(trimmed);
            }
        }

        wire
    }

    fn tool_use_block(request: &ToolUseRequest) -> WireBlock {
        WireBlock::ToolUse {
            id: request.id.clone(),
            name: request.name.clone(),
            input: Value::Object(request.arguments.clone()),
        }
    }

    fn tool_result_block(tool_use_id: &str, payload: &ToolResultPayload) -> WireBlock {
        let mut content: Vec<Value> = payload
            .content
            .iter()
            .filter_map(|c| match c {
                ResultContent::Text { text } => Some(json!({ "type": "text", "text": text })),
                ResultContent::Image { data, mime_type } => Some(json!({
                    "type": "image",
                    "source": { "type": "base64", "media_type": mime_type, "data": data },
                })),
                ResultContent::Resource { resource } => {
                    Some(json!({ "type": "text", "text": resource.to_string() }))
                }
                ResultContent::Unknown => None,
            })
            .collect();
        if content.is_empty() {
            content.push(json!({ "type": "text", "text": "(no output)" }));
        }

        WireBlock::ToolResult {
            tool_use_id: tool_use_id.to_string(),
            content,
            is_error: payload.is_error,
        }
    }

    fn convert_tools(tools: &[ToolDescriptor]) -> Vec<WireTool<'_>> {
        tools
            .iter()
            .map(|t| WireTool {
                name: &t.name,
                description: &t.description,
                input_schema: &t.input_schema,
            })
            .collect()
    }

    fn convert_response(response: MessagesResponse) -> ModelResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
                ResponseBlock::ToolUse { id, name, input } => {
                    let arguments = match input {
                        Value::Object(map) => map,
                        _ => serde_json::Map::new(),
                    };
                    Some(ContentBlock::ToolUse(ToolUseRequest { id, name, arguments }))
                }
                ResponseBlock::Other => None,
            })
            .collect();

        ModelResponse {
            content,
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
            finish_reason: response.stop_reason.as_deref().map(FinishReason::from_wire),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.request(reqwest::Method::GET, "/v1/models").send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn invoke(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: Option<&[ToolDescriptor]>,
        options: &GenerationOptions,
    ) -> Result<ModelResponse> {
        let body = MessagesRequest {
            model: &options.model,
            max_tokens: options.max_tokens,
            messages: Self::convert_messages(messages),
            system,
            tools: tools.filter(|t| !t.is_empty()).map(Self::convert_tools),
            temperature: options.temperature,
            top_p: options.top_p,
            stop_sequences: (!options.stop_sequences.is_empty())
                .then_some(options.stop_sequences.as_slice()),
        };

        tracing::debug!(model = %options.model, messages = body.messages.len(), "Sending Messages API request");

        let response = self
            .request(reqwest::Method::POST, "/v1/messages")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ModelApi(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            429 => return Err(AgentError::RateLimited("Anthropic API returned 429".into())),
            401 | 403 => return Err(AgentError::Auth("Invalid Anthropic API key".into())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status, body = %body, "Anthropic API error");
                return Err(AgentError::ModelApi(format!("HTTP {status}: {body}")));
            }
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ModelApi(format!("failed to parse response: {e}")))?;

        Ok(Self::convert_response(parsed))
    }
}

// --- Messages API types ---

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WireBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Vec<Value>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: String,
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_json(messages: &[Message]) -> Value {
        serde_json::to_value(AnthropicProvider::convert_messages(messages)).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = AnthropicConfig::new("sk-ant-test").with_base_url("https://proxy.local/");
        assert_eq!(config.base_url, "https://proxy.local");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_tool_round_trip_mapping() {
        let request = ToolUseRequest::new(
            "get_order_by_id",
            json!({"order_id": "24601"}).as_object().cloned().unwrap(),
        )
        .with_id("toolu_1");
        let messages = vec![
            Message::user("What's the status of order 24601?"),
            Message::assistant("Let me look that up."),
            Message::tool_use(request),
            Message::tool_result("toolu_1", ToolResultPayload::text("Status: Shipped")),
        ];

        let wire = wire_json(&messages);
        let turns = wire.as_array().unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1]["role"], "assistant");
        assert_eq!(turns[1]["content"][1]["type"], "tool_use");
        assert_eq!(turns[1]["content"][1]["input"]["order_id"], "24601");
        assert_eq!(turns[2]["role"], "user");
        assert_eq!(turns[2]["content"][0]["type"], "tool_result");
        assert_eq!(turns[2]["content"][0]["tool_use_id"], "toolu_1");
        assert!(turns[2]["content"][0].get("is_error").is_none());
    }

    #[test]
    fn test_system_error_merges_into_user_turn() {
        let messages = vec![
            Message::user("hi"),
            Message::system_error("Error occurred: timeout. Please try again."),
            Message::user("hello?"),
        ];
        let wire = wire_json(&messages);
        let turns = wire.as_array().unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0]["content"].as_array().unwrap().len(), 3);
        assert!(turns[0]["content"][1]["text"].as_str().unwrap().starts_with("[system error]"));
    }

    #[test]
    fn test_trailing_assistant_text_is_trimmed() {
        let messages = vec![Message::user("hi"), Message::assistant("Working on it \n")];
        let wire = wire_json(&messages);
        assert_eq!(wire[1]["content"][0]["text"], "Working on it");
    }

    #[test]
    fn test_error_result_flagged() {
        let messages = vec![Message::tool_result("t", ToolResultPayload::error("Tool not found: x"))];
        let wire = wire_json(&messages);
        assert_eq!(wire[0]["content"][0]["is_error"], true);
    }

    #[test]
    fn test_unrendered_result_blocks_are_dropped() {
        let payload = ToolResultPayload {
            content: vec![ResultContent::Unknown],
            is_error: false,
        };
        let wire = wire_json(&[Message::tool_result("t", payload)]);
        let content = &wire[0]["content"][0]["content"];
        assert_eq!(content.as_array().unwrap().len(), 1);
        assert_eq!(content[0]["text"], "(no output)");
    }

    #[test]
    fn test_response_conversion_skips_unknown_blocks() {
        let raw = json!({
            "id": "msg_1",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "x"},
                {"type": "text", "text": "Checking."},
                {"type": "tool_use", "id": "toolu_9", "name": "cancel_order", "input": {"order_id": "13579"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let response = AnthropicProvider::convert_response(parsed);

        assert_eq!(response.content.len(), 2);
        assert_eq!(response.text(), "Checking.");
        let call = response.tool_uses().next().unwrap();
        assert_eq!(call.id, "toolu_9");
        assert_eq!(call.text_arg("order_id").as_deref(), Some("13579"));
        assert_eq!(response.finish_reason, Some(FinishReason::ToolUse));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }
}
