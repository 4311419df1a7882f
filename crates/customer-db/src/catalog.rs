//! Resources and prompt templates served next to the tools

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use agent_core::{
    AgentError, Result as CoreResult,
    gateway::{PromptMessage, PromptResult, PromptTemplate, Resource, ResourceDescriptor},
};

use crate::store::CustomerStore;

pub struct CustomersResource {
    store: Arc<CustomerStore>,
}

impl CustomersResource {
    pub fn new(store: Arc<CustomerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Resource for CustomersResource {
    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: "customers://all".into(),
            name: "list_customers".into(),
            description: Some("Return a list of all customers".into()),
            mime_type: Some("text/plain".into()),
        }
    }

    async fn read(&self) -> CoreResult<String> {
        Ok(self
            .store
            .customers()
            .await
            .iter()
            .map(|c| format!("Customer {}: {} ({})", c.id, c.name, c.email))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

pub struct OrdersResource {
    store: Arc<CustomerStore>,
}

impl OrdersResource {
    pub fn new(store: Arc<CustomerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Resource for OrdersResource {
    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: "orders://all".into(),
            name: "list_orders".into(),
            description: Some("Return a list of all orders".into()),
            mime_type: Some("text/plain".into()),
        }
    }

    async fn read(&self) -> CoreResult<String> {
        Ok(self
            .store
            .orders()
            .await
            .iter()
            .map(|o| format!("Order {}: {} (Status: {})", o.id, o.product, o.status))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn argument<'a>(arguments: &'a HashMap<String, String>, name: &str) -> CoreResult<&'a str> {
    arguments
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AgentError::Protocol(format!("Missing prompt argument: {name}")))
}

pub struct SearchCustomerPrompt;

impl PromptTemplate for SearchCustomerPrompt {
    fn name(&self) -> &str {
        "search_customer"
    }

    fn render(&self, arguments: &HashMap<String, String>) -> CoreResult<PromptResult> {
        let search_type = argument(arguments, "search_type")?;
        let value = argument(arguments, "value")?;
        Ok(PromptResult {
            description: Some("Create a prompt for searching customers".into()),
            messages: vec![PromptMessage::user_text(format!(
                "Please find the customer with {search_type} matching '{value}'"
            ))],
        })
    }
}

pub struct TrackOrderPrompt;

impl PromptTemplate for TrackOrderPrompt {
    fn name(&self) -> &str {
        "track_order"
    }

    fn render(&self, arguments: &HashMap<String, String>) -> CoreResult<PromptResult> {
        let order_id = argument(arguments, "order_id")?;
        Ok(PromptResult {
            description: Some("Create a prompt for tracking an order".into()),
            messages: vec![PromptMessage::user_text(format!(
                "What's the status of order {order_id}?"
            ))],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_customer_listing() {
        let resource = CustomersResource::new(Arc::new(CustomerStore::sample()));
        let text = resource.read().await.unwrap();
        assert_eq!(text.lines().count(), 10);
        assert_eq!(
            text.lines().next(),
            Some("Customer 1213210: John Doe (john@gmail.com)")
        );
    }

    #[tokio::test]
    async fn test_order_listing_reflects_cancellation() {
        let store = Arc::new(CustomerStore::sample());
        store.cancel_order("13579").await;
        let text = OrdersResource::new(store).read().await.unwrap();
        assert!(text.contains("Order 13579: Smartphone Case (Status: Cancelled)"));
    }

    #[test]
    fn test_prompts() {
        let args = HashMap::from([
            ("search_type".to_string(), "email".to_string()),
            ("value".to_string(), "megana@gmail.com".to_string()),
        ]);
        let rendered = SearchCustomerPrompt.render(&args).unwrap();
        assert_eq!(
            rendered.messages[0].text(),
            Some("Please find the customer with email matching 'megana@gmail.com'")
        );

        let args = HashMap::from([("order_id".to_string(), "47652".to_string())]);
        let rendered = TrackOrderPrompt.render(&args).unwrap();
        assert_eq!(rendered.messages[0].text(), Some("What's the status of order 47652?"));

        assert!(TrackOrderPrompt.render(&HashMap::new()).is_err());
    }
}
