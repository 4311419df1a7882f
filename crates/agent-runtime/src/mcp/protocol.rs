//! JSON-RPC 2.0 framing and MCP result shapes

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use agent_core::gateway::{PromptResult, ResourceContent, ResourceDescriptor, ServerInfo};
use agent_core::tool::ToolDescriptor;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const METHOD_NOT_FOUND: i64 = -32601;

/// An outgoing request or notification
#[derive(Debug, Serialize)]
pub struct Outgoing<'a> {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> Outgoing<'a> {
    pub fn request(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            method,
            params,
        }
    }

    pub fn notification(method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: None,
            method,
            params,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Any line the server sends, before it is classified
#[derive(Debug, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug)]
pub enum Inbound {
    Response {
        id: Value,
        outcome: Result<Value, RpcError>,
    },
    Request {
        id: Value,
        method: String,
    },
    Notification {
        method: String,
    },
    Unknown,
}

impl From<RawMessage> for Inbound {
    fn from(raw: RawMessage) -> Self {
        match (raw.id, raw.method) {
            (Some(id), Some(method)) => Self::Request { id, method },
            (Some(id), None) => {
                let outcome = match raw.error {
                    Some(error) => Err(error),
                    None => Ok(raw.result.unwrap_or(Value::Null)),
                };
                Self::Response { id, outcome }
            }
            (None, Some(method)) => Self::Notification { method },
            (None, None) => Self::Unknown,
        }
    }
}

pub fn response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": JSONRPC_VERSION, "id": id, "result": result })
}

pub fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": { "code": code, "message": message.into() },
    })
}

pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

// --- Result shapes ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub server_info: Option<Implementation>,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl From<InitializeResult> for ServerInfo {
    fn from(result: InitializeResult) -> Self {
        let (name, version) = result
            .server_info
            .map_or_else(|| ("unknown".to_string(), None), |i| (i.name, i.version));
        Self {
            name,
            version,
            protocol_version: result.protocol_version,
            instructions: result.instructions,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResult {
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReadResourceResult {
    #[serde(default)]
    pub contents: Vec<ResourceContent>,
}

pub type GetPromptResult = PromptResult;

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(raw: Value) -> Inbound {
        serde_json::from_value::<RawMessage>(raw).unwrap().into()
    }

    #[test]
    fn test_request_serialization() {
        let line = serde_json::to_value(Outgoing::request(7, "tools/list", json!({}))).unwrap();
        assert_eq!(line, json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list", "params": {}}));

        let note = serde_json::to_value(Outgoing::notification("notifications/initialized", json!({}))).unwrap();
        assert!(note.get("id").is_none());
    }

    #[test]
    fn test_classify_inbound() {
        assert!(matches!(
            classify(json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}})),
            Inbound::Response { outcome: Ok(_), .. }
        ));
        assert!(matches!(
            classify(json!({"jsonrpc": "2.0", "id": 2, "error": {"code": -32602, "message": "bad params"}})),
            Inbound::Response { outcome: Err(RpcError { code: -32602, .. }), .. }
        ));
        assert!(matches!(
            classify(json!({"jsonrpc": "2.0", "id": "srv-1", "method": "ping"})),
            Inbound::Request { method, .. } if method == "ping"
        ));
        assert!(matches!(
            classify(json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {}})),
            Inbound::Notification { .. }
        ));
    }

    #[test]
    fn test_tools_list_parsing() {
        let result: ListToolsResult = serde_json::from_value(json!({
            "tools": [{
                "name": "get_user",
                "description": "Lookup a user",
                "inputSchema": {"type": "object", "properties": {"key": {"type": "string"}}}
            }]
        }))
        .unwrap();
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].input_schema["type"], "object");
        assert!(result.next_cursor.is_none());
    }

    #[test]
    fn test_server_info_from_initialize() {
        let result: InitializeResult = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "customer-db", "version": "1.0"}
        }))
        .unwrap();
        let info = ServerInfo::from(result);
        assert_eq!(info.name, "customer-db");
        assert_eq!(info.version.as_deref(), Some("1.0"));
    }
}
