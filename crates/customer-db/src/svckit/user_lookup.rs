//! User Lookup Tool
//!
//! Finds a customer by email, phone, or username.

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{
    Result as CoreResult, Tool, ToolResultPayload, ToolSchema, ToolUseRequest,
    tool::ParameterSchema,
};

use crate::model::UserLookup;
use crate::store::CustomerStore;

pub struct UserLookupTool {
    store: Arc<CustomerStore>,
}

impl UserLookupTool {
    pub fn new(store: Arc<CustomerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UserLookupTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_user".into(),
            description: "Look up a user by email, phone, or username.".into(),
            parameters: vec![
                ParameterSchema::required(
                    "key",
                    "string",
                    "The attribute to search by (email, phone, or username)",
                ),
                ParameterSchema::required("value", "string", "The value to search for"),
            ],
        }
    }

    async fn execute(&self, call: &ToolUseRequest) -> CoreResult<ToolResultPayload> {
        let key = call.required_text_arg("key")?;
        let value = call.required_text_arg("value")?;

        let text = match self.store.find_user(&key, &value).await {
            UserLookup::Found(c) => format!(
                "Found user:\nName: {}\nEmail: {}\nPhone: {}\nUsername: {}\nCustomer ID: {}",
                c.name, c.email, c.phone, c.username, c.id
            ),
            UserLookup::NotFound { key, value } => {
                format!("Couldn't find a user with {key} of {value}")
            }
            UserLookup::InvalidKey(key) => format!("Invalid key: {key}"),
        };

        Ok(ToolResultPayload::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(args: serde_json::Value) -> ToolUseRequest {
        ToolUseRequest::new("get_user", args.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_found_by_username() {
        let tool = UserLookupTool::new(Arc::new(CustomerStore::sample()));
        let result = tool
            .execute(&call(json!({"key": "username", "value": "priya123"})))
            .await
            .unwrap();
        assert_eq!(
            result.text_content(),
            "Found user:\nName: Priya Patel\nEmail: priya@candy.com\nPhone: 987-654-3210\nUsername: priya123\nCustomer ID: 2837622"
        );
    }

    #[tokio::test]
    async fn test_not_found_is_plain_output() {
        let tool = UserLookupTool::new(Arc::new(CustomerStore::sample()));
        let result = tool
            .execute(&call(json!({"key": "email", "value": "nobody@example.com"})))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(
            result.text_content(),
            "Couldn't find a user with email of nobody@example.com"
        );
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let tool = UserLookupTool::new(Arc::new(CustomerStore::sample()));
        let result = tool
            .execute(&call(json!({"key": "address", "value": "x"})))
            .await
            .unwrap();
        assert_eq!(result.text_content(), "Invalid key: address");
    }
}
