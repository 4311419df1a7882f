//! Customer Orders Tool
//!
//! Lists every order placed by one customer.

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{
    Result as CoreResult, Tool, ToolResultPayload, ToolSchema, ToolUseRequest,
    tool::ParameterSchema,
};

use crate::model::Order;
use crate::store::CustomerStore;

pub struct CustomerOrdersTool {
    store: Arc<CustomerStore>,
}

impl CustomerOrdersTool {
    pub fn new(store: Arc<CustomerStore>) -> Self {
        Self { store }
    }

    fn summarize(order: &Order) -> String {
        format!(
            "Order ID: {}\nProduct: {}\nQuantity: {}\nPrice: ${}\nStatus: {}",
            order.id, order.product, order.quantity, order.price, order.status
        )
    }
}

#[async_trait]
impl Tool for CustomerOrdersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_customer_orders".into(),
            description: "List all orders for a specific customer.".into(),
            parameters: vec![ParameterSchema::required(
                "customer_id",
                "string",
                "The customer's unique identifier",
            )],
        }
    }

    async fn execute(&self, call: &ToolUseRequest) -> CoreResult<ToolResultPayload> {
        let customer_id = call.required_text_arg("customer_id")?;
        let orders = self.store.customer_orders(&customer_id).await;

        if orders.is_empty() {
            return Ok(ToolResultPayload::text(format!(
                "No orders found for customer {customer_id}"
            )));
        }

        let list = orders
            .iter()
            .map(Self::summarize)
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(ToolResultPayload::text(format!(
            "Orders for customer {customer_id}:\n\n{list}"
        )))
    }
}
