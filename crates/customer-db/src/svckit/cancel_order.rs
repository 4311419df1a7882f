//! Cancel Order Tool
//!
//! The only tool here with side effects.

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{
    Result as CoreResult, Tool, ToolResultPayload, ToolSchema, ToolUseRequest,
    tool::ParameterSchema,
};

use crate::model::CancelOutcome;
use crate::store::CustomerStore;

pub struct CancelOrderTool {
    store: Arc<CustomerStore>,
}

impl CancelOrderTool {
    pub fn new(store: Arc<CustomerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CancelOrderTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "cancel_order".into(),
            description: "Cancel a processing order.".into(),
            parameters: vec![ParameterSchema::required(
                "order_id",
                "string",
                "The unique identifier for the order to cancel",
            )],
        }
    }

    async fn execute(&self, call: &ToolUseRequest) -> CoreResult<ToolResultPayload> {
        let order_id = call.required_text_arg("order_id")?;

        let text = match self.store.cancel_order(&order_id).await {
            CancelOutcome::Cancelled => "Successfully cancelled the order",
            CancelOutcome::AlreadyCancelled => "Order has already been cancelled.",
            CancelOutcome::NotCancellable(_) => "Order has already shipped. Cannot cancel it.",
            CancelOutcome::NotFound => "Order not found",
        };

        Ok(ToolResultPayload::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(order_id: &str) -> ToolUseRequest {
        ToolUseRequest::new(
            "cancel_order",
            json!({ "order_id": order_id }).as_object().cloned().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_cancel_twice() {
        let tool = CancelOrderTool::new(Arc::new(CustomerStore::sample()));

        let first = tool.execute(&call("13579")).await.unwrap();
        assert_eq!(first.text_content(), "Successfully cancelled the order");

        let second = tool.execute(&call("13579")).await.unwrap();
        assert_eq!(second.text_content(), "Order has already been cancelled.");
    }

    #[tokio::test]
    async fn test_shipped_order_cannot_be_cancelled() {
        let tool = CancelOrderTool::new(Arc::new(CustomerStore::sample()));
        let result = tool.execute(&call("24601")).await.unwrap();
        assert_eq!(result.text_content(), "Order has already shipped. Cannot cancel it.");
    }

    #[tokio::test]
    async fn test_missing_argument_fails_validation() {
        let tool = CancelOrderTool::new(Arc::new(CustomerStore::sample()));
        let call = ToolUseRequest::new("cancel_order", serde_json::Map::new());
        assert!(tool.validate(&call).is_err());
    }
}
