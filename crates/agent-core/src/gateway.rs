//! Session Gateway
//!
//! The interface to whatever hosts the tools: a child process speaking MCP, or
//! an in-process [`LocalGateway`] over a [`ToolRegistry`]. The orchestrator only
//! sees this trait, so it does not care which transport sits behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::tool::{ToolDescriptor, ToolRegistry, ToolResultPayload, ToolUseRequest};

/// What the server reported during the handshake
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Free-form usage notes some servers send
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One message of a rendered prompt template
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: Value,
}

impl PromptMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: serde_json::json!({ "type": "text", "text": text.into() }),
        }
    }

    /// The text of a `{"type": "text"}` content body
    pub fn text(&self) -> Option<&str> {
        self.content.get("text").and_then(Value::as_str)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    #[serde(default)]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

/// Tool, resource and prompt operations of one established session
#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn initialize(&self) -> Result<ServerInfo>;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>>;

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContent>>;

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolResultPayload>;

    async fn get_prompt(&self, name: &str, arguments: HashMap<String, String>) -> Result<PromptResult>;

    /// Release the session. Called once, on every exit path.
    async fn close(&self) -> Result<()>;
}

/// A readable resource served by a [`LocalGateway`]
#[async_trait]
pub trait Resource: Send + Sync {
    fn descriptor(&self) -> ResourceDescriptor;

    async fn read(&self) -> Result<String>;
}

/// A prompt template served by a [`LocalGateway`]
pub trait PromptTemplate: Send + Sync {
    fn name(&self) -> &str;

    fn render(&self, arguments: &HashMap<String, String>) -> Result<PromptResult>;
}

/// In-process session gateway
pub struct LocalGateway {
    info: ServerInfo,
    tools: ToolRegistry,
    resources: Vec<Arc<dyn Resource>>,
    prompts: Vec<Arc<dyn PromptTemplate>>,
}

impl LocalGateway {
    pub fn new(name: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
                ..Default::default()
            },
            tools,
            resources: Vec::new(),
            prompts: Vec::new(),
        }
    }

    pub fn with_resource<R: Resource + 'static>(mut self, resource: R) -> Self {
        self.resources.push(Arc::new(resource));
        self
    }

    pub fn with_prompt<P: PromptTemplate + 'static>(mut self, prompt: P) -> Self {
        self.prompts.push(Arc::new(prompt));
        self
    }

    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

#[async_trait]
impl SessionGateway for LocalGateway {
    async fn initialize(&self) -> Result<ServerInfo> {
        Ok(self.info.clone())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.tools.descriptors())
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        Ok(self.resources.iter().map(|r| r.descriptor()).collect())
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContent>> {
        let resource = self
            .resources
            .iter()
            .find(|r| r.descriptor().uri == uri)
            .ok_or_else(|| AgentError::Protocol(format!("Unknown resource: {uri}")))?;
        let descriptor = resource.descriptor();

        Ok(vec![ResourceContent {
            uri: descriptor.uri,
            mime_type: descriptor.mime_type,
            text: Some(resource.read().await?),
        }])
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolResultPayload> {
        let call = ToolUseRequest::new(name, arguments);
        self.tools.execute(&call).await
    }

    async fn get_prompt(&self, name: &str, arguments: HashMap<String, String>) -> Result<PromptResult> {
        let prompt = self
            .prompts
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| AgentError::Protocol(format!("Unknown prompt: {name}")))?;
        prompt.render(&arguments)
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!(server = %self.info.name, "Local gateway closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting;

    #[async_trait]
    impl Resource for Greeting {
        fn descriptor(&self) -> ResourceDescriptor {
            ResourceDescriptor {
                uri: "greeting://hello".into(),
                name: "greeting".into(),
                description: None,
                mime_type: Some("text/plain".into()),
            }
        }

        async fn read(&self) -> Result<String> {
            Ok("Hello, world".into())
        }
    }

    struct Track;

    impl PromptTemplate for Track {
        fn name(&self) -> &str {
            "track_order"
        }

        fn render(&self, arguments: &HashMap<String, String>) -> Result<PromptResult> {
            let id = arguments.get("order_id").map_or("?", String::as_str);
            Ok(PromptResult {
                description: None,
                messages: vec![PromptMessage::user_text(format!("What's the status of order {id}?"))],
            })
        }
    }

    #[tokio::test]
    async fn test_local_gateway_resources_and_prompts() {
        let gateway = LocalGateway::new("test", ToolRegistry::new())
            .with_resource(Greeting)
            .with_prompt(Track);

        let resources = gateway.list_resources().await.unwrap();
        assert_eq!(resources.len(), 1);

        let content = gateway.read_resource("greeting://hello").await.unwrap();
        assert_eq!(content[0].text.as_deref(), Some("Hello, world"));
        assert!(gateway.read_resource("greeting://nope").await.is_err());

        let args = HashMap::from([("order_id".to_string(), "24601".to_string())]);
        let prompt = gateway.get_prompt("track_order", args).await.unwrap();
        assert_eq!(prompt.messages[0].text(), Some("What's the status of order 24601?"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let gateway = LocalGateway::new("test", ToolRegistry::new());
        let err = gateway.call_tool("missing", Map::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(_)));
    }
}
