//! # customer-db
//!
//! Customer and order support tools for the agent.
//!
//! ## Tools
//!
//! ```text
//! ┌───────────────────────┬────────────────────────────┬─────────────┐
//! │ tool                  │ arguments                  │ side effect │
//! ├───────────────────────┼────────────────────────────┼─────────────┤
//! │ get_user              │ key, value                 │ no          │
//! │ get_order_by_id       │ order_id                   │ no          │
//! │ get_customer_orders   │ customer_id                │ no          │
//! │ cancel_order          │ order_id                   │ yes         │
//! └───────────────────────┴────────────────────────────┴─────────────┘
//! ```
//!
//! Resources `customers://all` and `orders://all` list the store contents.
//! Prompt templates `search_customer` and `track_order` render ready-made
//! user questions.

pub mod catalog;
pub mod error;
pub mod model;
pub mod store;
pub mod svckit;

use std::sync::Arc;

use agent_core::{LocalGateway, ToolRegistry};

pub use error::{Result, StoreError};
pub use model::{CancelOutcome, Customer, LookupKey, Order, OrderStatus, UserLookup};
pub use store::CustomerStore;

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{CancelOrderTool, CustomerOrdersTool, OrderLookupTool, UserLookupTool};
}

pub const SERVER_NAME: &str = "customer-db";

/// Register the four customer tools against one store
pub fn registry(store: &Arc<CustomerStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tools::UserLookupTool::new(Arc::clone(store)));
    registry.register(tools::OrderLookupTool::new(Arc::clone(store)));
    registry.register(tools::CustomerOrdersTool::new(Arc::clone(store)));
    registry.register(tools::CancelOrderTool::new(Arc::clone(store)));
    registry
}

/// In-process session gateway serving the tools, resources and prompts
pub fn gateway(store: &Arc<CustomerStore>) -> LocalGateway {
    LocalGateway::new(SERVER_NAME, registry(store))
        .with_resource(catalog::CustomersResource::new(Arc::clone(store)))
        .with_resource(catalog::OrdersResource::new(Arc::clone(store)))
        .with_prompt(catalog::SearchCustomerPrompt)
        .with_prompt(catalog::TrackOrderPrompt)
}
