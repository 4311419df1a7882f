//! Command line and environment configuration

use std::path::PathBuf;

use agent_core::{AgentError, OrchestratorConfig, Result, guard::DEFAULT_MAX_LOOPS, provider::DEFAULT_MODEL};
use agent_runtime::AnthropicConfig;
use clap::Parser;

/// Chat with a language model that can call the tools of a local MCP server
#[derive(Debug, Parser)]
#[command(name = "agent-cli", version, about)]
pub struct Cli {
    /// Tool server script to launch (.py or .js)
    #[arg(value_name = "SERVER_SCRIPT")]
    pub server_script: PathBuf,

    /// Model identifier
    #[arg(long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Output token cap per model call
    #[arg(long, env = "ANTHROPIC_MAX_TOKENS", default_value_t = 1000)]
    pub max_tokens: u32,

    /// Automatic turns allowed before asking the user again
    #[arg(long, env = "AGENT_MAX_LOOPS", default_value_t = DEFAULT_MAX_LOOPS)]
    pub max_loops: u32,

    /// Append-only run log
    #[arg(long, env = "AGENT_LOG_FILE", default_value = "agent-run.log")]
    pub log_file: PathBuf,

    /// Re-list the server's tools before every model call
    #[arg(long)]
    pub refresh_tools: bool,

    /// Messages API base URL
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true, hide = true)]
    pub api_key: Option<String>,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn anthropic(&self) -> Result<AnthropicConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;

        let config = AnthropicConfig::new(api_key);
        Ok(match &self.base_url {
            Some(url) => config.with_base_url(url.as_str()),
            None => config,
        })
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig {
            max_loops: self.max_loops,
            refresh_catalog: self.refresh_tools,
            ..OrchestratorConfig::default()
        };
        config.generation.model.clone_from(&self.model);
        config.generation.max_tokens = self.max_tokens;
        config
    }

    pub const fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
