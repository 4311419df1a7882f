//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Tool-hosting process unreachable or the handshake was rejected
    #[error("Connection error: {0}")]
    Connection(String),

    /// Tool script has an extension we don't know how to launch
    #[error("Unsupported server script: {0} (expected a .py or .js file)")]
    UnsupportedScript(String),

    /// Model API call failed
    #[error("Model API error: {0}")]
    ModelApi(String),

    /// Tool not found in the catalog or registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// The completion judge call failed
    #[error("Completion check failed: {0}")]
    CompletionJudge(String),

    /// Malformed or rejected session protocol exchange
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Errors that abort the run instead of being folded into the transcript
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::UnsupportedScript(_) | Self::Config(_)
        )
    }

    /// Transient failures worth one more attempt
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Io(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::ModelApi(msg) => format!("The language model call failed: {msg}"),
            Self::CompletionJudge(msg) => format!("Checking whether the answer was complete failed: {msg}"),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::Protocol(msg) => format!("The tool server sent an unexpected reply: {msg}"),
            Self::RateLimited(_) => "The model API is rate limiting requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication with the model API failed. Check ANTHROPIC_API_KEY.".into(),
            other => other.to_string(),
        }
    }
}
