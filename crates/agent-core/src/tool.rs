//! Tool System
//!
//! Types describing tools as the model sees them (descriptors and the catalog
//! snapshot), the request/result shapes that flow through the conversation, and
//! the in-process [`Tool`] trait used by locally hosted tool sets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool invocation requested by the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolUseRequest {
    /// Call ID, echoed back on the matching tool result
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolUseRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: format!("toolu_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Read an argument as text. Numbers are accepted and rendered as-is, so
    /// `{"order_id": 24601}` and `{"order_id": "24601"}` read the same.
    pub fn text_arg(&self, name: &str) -> Option<String> {
        match self.arguments.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Like [`text_arg`](Self::text_arg) but missing values are a validation error
    pub fn required_text_arg(&self, name: &str) -> Result<String> {
        self.text_arg(name).ok_or_else(|| {
            AgentError::ToolValidation(format!(
                "Missing required parameter '{name}' for tool '{}'",
                self.name
            ))
        })
    }
}

/// A tool as advertised by the session gateway
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique within a session
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// JSON Schema for the tool arguments
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Snapshot of the tools visible to the model
#[derive(Clone, Debug)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ToolCatalog {
    pub const fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// One piece of content inside a tool result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: Value,
    },
    /// Block types this client does not render (audio, resource links)
    #[serde(other)]
    Unknown,
}

/// Content returned by a tool call, kept verbatim in the conversation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResultPayload {
    #[serde(default)]
    pub content: Vec<ResultContent>,

    /// Set when the tool (or the call itself) failed
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolResultPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ResultContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ResultContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// All text parts joined by newlines
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ResultContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            enum_values: None,
        }
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// Schema of a locally hosted tool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// JSON Schema object for the parameters
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(param.param_type.clone()));
            prop.insert("description".into(), Value::String(param.description.clone()));
            if let Some(values) = &param.enum_values {
                prop.insert("enum".into(), Value::Array(values.clone()));
            }
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
        }
    }
}

/// Tool trait - implement to host a tool in-process
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolUseRequest) -> Result<ToolResultPayload>;

    /// Validate arguments before execution
    fn validate(&self, call: &ToolUseRequest) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for in-process tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Validate and execute a tool call
    pub async fn execute(&self, call: &ToolUseRequest) -> Result<ToolResultPayload> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;
        tool.execute(call).await
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.schema().descriptor())
            .collect()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo a message back".into(),
                parameters: vec![ParameterSchema::required("message", "string", "Text to echo")],
            }
        }

        async fn execute(&self, call: &ToolUseRequest) -> Result<ToolResultPayload> {
            Ok(ToolResultPayload::text(call.required_text_arg("message")?))
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_text_arg_accepts_numbers() {
        let call = ToolUseRequest::new("get_order_by_id", args(json!({"order_id": 24601})));
        assert_eq!(call.text_arg("order_id").as_deref(), Some("24601"));
        assert!(call.text_arg("missing").is_none());
    }

    #[test]
    fn test_input_schema_lists_required() {
        let schema = EchoTool.schema().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["message"]));
        assert_eq!(schema["properties"]["message"]["type"], "string");
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ToolCatalog::new(vec![EchoTool.schema().descriptor()]);
        assert!(catalog.contains("echo"));
        assert!(!catalog.contains("cancel_order"));
        assert_eq!(catalog.names(), vec!["echo"]);
    }

    #[test]
    fn test_payload_deserializes_mcp_shape() {
        let payload: ToolResultPayload = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "Order not found"}],
            "isError": false
        }))
        .unwrap();
        assert_eq!(payload.text_content(), "Order not found");
        assert!(!payload.is_error);
    }

    #[test]
    fn test_payload_tolerates_unrendered_blocks() {
        let payload: ToolResultPayload = serde_json::from_value(json!({
            "content": [
                {"type": "audio", "data": "UklGRg==", "mimeType": "audio/wav"},
                {"type": "text", "text": "Order 24601 shipped"},
                {"type": "resource_link", "uri": "orders://24601", "name": "order"}
            ]
        }))
        .unwrap();
        assert_eq!(payload.content.len(), 3);
        assert_eq!(payload.content[0], ResultContent::Unknown);
        assert_eq!(payload.text_content(), "Order 24601 shipped");
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let ok = registry
            .execute(&ToolUseRequest::new("echo", args(json!({"message": "hi"}))))
            .await
            .unwrap();
        assert_eq!(ok.text_content(), "hi");

        let missing = registry.execute(&ToolUseRequest::new("echo", Map::new())).await;
        assert!(matches!(missing, Err(AgentError::ToolValidation(_))));

        let unknown = registry.execute(&ToolUseRequest::new("nope", Map::new())).await;
        assert!(matches!(unknown, Err(AgentError::ToolNotFound(_))));
    }
}
