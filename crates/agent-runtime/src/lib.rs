//! # agent-runtime
//!
//! Runtime adapters for the tool-calling agent.
//!
//! ## Providers
//!
//! - **Anthropic** (default): Claude via the Messages API
//!
//! ## Session gateways
//!
//! - **MCP over stdio**: launches a `.py` or `.js` tool server as a child
//!   process and talks JSON-RPC 2.0 to it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{AnthropicConfig, AnthropicProvider, McpClient, ServerLaunch};
//!
//! let provider = AnthropicProvider::from_config(AnthropicConfig::new(api_key))?;
//! let gateway = McpClient::spawn(&ServerLaunch::from_script("server.py")?)?;
//! let mut orchestrator = OrchestratorBuilder::new()
//!     .provider(Arc::new(provider))
//!     .gateway(Arc::new(gateway))
//!     .build()?;
//! ```

#[cfg(feature = "anthropic")]
pub mod anthropic;
pub mod mcp;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use mcp::{McpClient, ServerLaunch};

// Re-export core types for convenience
pub use agent_core::{
    AgentError, LlmProvider, Message, Orchestrator, OrchestratorBuilder, Result, Role,
    SessionGateway,
};
