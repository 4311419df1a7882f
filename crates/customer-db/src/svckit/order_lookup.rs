//! Order Lookup Tool

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{
    Result as CoreResult, Tool, ToolResultPayload, ToolSchema, ToolUseRequest,
    tool::ParameterSchema,
};

use crate::store::CustomerStore;

pub struct OrderLookupTool {
    store: Arc<CustomerStore>,
}

impl OrderLookupTool {
    pub fn new(store: Arc<CustomerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for OrderLookupTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_order_by_id".into(),
            description: "Retrieve details of a specific order.".into(),
            parameters: vec![ParameterSchema::required(
                "order_id",
                "string",
                "The unique identifier for the order",
            )],
        }
    }

    async fn execute(&self, call: &ToolUseRequest) -> CoreResult<ToolResultPayload> {
        let order_id = call.required_text_arg("order_id")?;

        let text = match self.store.order(&order_id).await {
            Some(o) => format!(
                "Order details:\nID: {}\nProduct: {}\nQuantity: {}\nPrice: ${}\nStatus: {}\nCustomer ID: {}",
                o.id, o.product, o.quantity, o.price, o.status, o.customer_id
            ),
            None => "Order not found".to_string(),
        };

        Ok(ToolResultPayload::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_order_details() {
        let tool = OrderLookupTool::new(Arc::new(CustomerStore::sample()));
        let call = ToolUseRequest::new(
            "get_order_by_id",
            json!({"order_id": 24601}).as_object().cloned().unwrap(),
        );
        let result = tool.execute(&call).await.unwrap();
        assert_eq!(
            result.text_content(),
            "Order details:\nID: 24601\nProduct: Wireless Headphones\nQuantity: 1\nPrice: $79.99\nStatus: Shipped\nCustomer ID: 1213210"
        );
    }

    #[tokio::test]
    async fn test_missing_order() {
        let tool = OrderLookupTool::new(Arc::new(CustomerStore::sample()));
        let call = ToolUseRequest::new(
            "get_order_by_id",
            json!({"order_id": "99999"}).as_object().cloned().unwrap(),
        );
        assert_eq!(tool.execute(&call).await.unwrap().text_content(), "Order not found");
    }
}
