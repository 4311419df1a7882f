//! # agent-core
//!
//! Conversation orchestration for a tool-using language-model agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Orchestrator                            │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────────────┐  │
//! │  │ LoopGuard  │  │ ToolInvoker  │──│ SessionGateway (MCP, …)  │  │
//! │  └────────────┘  └──────────────┘  └──────────────────────────┘  │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────────────┐  │
//! │  │Conversation│  │ Judge        │──│ LlmProvider (Strategy)   │  │
//! │  └────────────┘  └──────────────┘  └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` and `SessionGateway` traits keep the loop independent of
//! the model vendor and of the transport used to reach the tools.

pub mod error;
pub mod gateway;
pub mod guard;
pub mod input;
pub mod invoker;
pub mod judge;
pub mod message;
pub mod mock;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod tool;
pub mod transcript;

pub use error::{AgentError, Result};
pub use gateway::{LocalGateway, SessionGateway};
pub use guard::LoopGuard;
pub use input::UserInput;
pub use judge::{CompletionJudge, Verdict};
pub use message::{Conversation, Message, MessageContent, Role};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorConfig, Phase};
pub use provider::{ContentBlock, GenerationOptions, LlmProvider, ModelResponse};
pub use session::ChatSession;
pub use tool::{
    ParameterSchema, Tool, ToolCatalog, ToolDescriptor, ToolRegistry, ToolResultPayload,
    ToolSchema, ToolUseRequest,
};
pub use transcript::{Notice, TranscriptSink};
