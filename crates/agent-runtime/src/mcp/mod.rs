//! MCP Session Client
//!
//! Launches a tool server as a child process and speaks JSON-RPC 2.0 to it
//! over stdin/stdout, one message per line.

mod client;
mod launch;
pub mod protocol;

pub use client::McpClient;
pub use launch::ServerLaunch;
