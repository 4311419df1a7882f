//! Service Kit - Agent Tools
//!
//! Customer and order tools that implement `agent_core::Tool`.

mod cancel_order;
mod customer_orders;
mod order_lookup;
mod user_lookup;

pub use cancel_order::CancelOrderTool;
pub use customer_orders::CustomerOrdersTool;
pub use order_lookup::OrderLookupTool;
pub use user_lookup::UserLookupTool;
