//! Tool Invoker
//!
//! Runs one tool-use request against the session gateway. Failures never
//! escape: they come back as an error payload so the model sees them on its
//! next turn.

use std::sync::Arc;

use crate::error::AgentError;
use crate::gateway::SessionGateway;
use crate::tool::{ToolCatalog, ToolResultPayload, ToolUseRequest};

pub struct ToolInvoker {
    gateway: Arc<dyn SessionGateway>,
}

impl ToolInvoker {
    pub fn new(gateway: Arc<dyn SessionGateway>) -> Self {
        Self { gateway }
    }

    /// Execute a request the model made against the current catalog
    pub async fn execute(&self, request: &ToolUseRequest, catalog: &ToolCatalog) -> ToolResultPayload {
        if !catalog.contains(&request.name) {
            tracing::warn!(tool = %request.name, "Model requested a tool outside the catalog");
            return failure(&AgentError::ToolNotFound(request.name.clone()));
        }

        tracing::info!(tool = %request.name, args = %serde_json::Value::Object(request.arguments.clone()), "Tool call");

        match self
            .gateway
            .call_tool(&request.name, request.arguments.clone())
            .await
        {
            Ok(payload) if payload.is_error => {
                tracing::warn!(tool = %request.name, "Tool reported an error");
                ToolResultPayload::error(
                    AgentError::ToolExecution(payload.text_content()).to_string(),
                )
            }
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(tool = %request.name, error = %e, "Tool call failed");
                failure(&e)
            }
        }
    }
}

/// Map any failure into the tool-execution category
fn failure(err: &AgentError) -> ToolResultPayload {
    let err = match err {
        AgentError::ToolExecution(_) => err.to_string(),
        other => AgentError::ToolExecution(other.to_string()).to_string(),
    };
    ToolResultPayload::error(err)
}
