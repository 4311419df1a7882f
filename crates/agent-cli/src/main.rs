//! Interactive chat client
//!
//! Launches a tool server script, connects to it over MCP, and runs the
//! conversation loop against the Anthropic Messages API until the user types
//! `quit`, closes stdin, or presses Ctrl-C.

mod config;
mod console;
mod logging;

use std::sync::Arc;

use clap::Parser;

use agent_core::{LlmProvider, OrchestratorBuilder, SessionGateway};
use agent_runtime::{AnthropicProvider, McpClient, ServerLaunch};

use crate::config::Cli;
use crate::console::{ConsoleTranscript, StdinInput};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before clap reads it
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init(&cli.log_file, cli.log_level())?;

    // Reject unknown script types before starting anything
    let launch = ServerLaunch::from_script(&cli.server_script)?;

    let provider = Arc::new(AnthropicProvider::from_config(cli.anthropic()?)?);
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Anthropic API reachable"),
        Ok(false) | Err(_) => tracing::warn!("⚠ Anthropic API health check failed - model calls may fail"),
    }

    let gateway = Arc::new(McpClient::spawn(&launch)?);
    let outcome = chat(&cli, provider, gateway.clone()).await;

    if let Err(e) = gateway.close().await {
        tracing::warn!(error = %e, "Failed to close tool session");
    }

    outcome
}

async fn chat(
    cli: &Cli,
    provider: Arc<AnthropicProvider>,
    gateway: Arc<McpClient>,
) -> anyhow::Result<()> {
    let mut orchestrator = OrchestratorBuilder::new()
        .provider(provider)
        .gateway(gateway)
        .transcript(Arc::new(ConsoleTranscript))
        .config(cli.orchestrator())
        .build()?;

    let info = orchestrator.connect().await?;
    println!(
        "Connected to {} with tools: {}",
        info.name,
        orchestrator.catalog().names().join(", ")
    );
    println!("Type your queries or 'quit' to exit.");

    let mut input = StdinInput::new();
    tokio::select! {
        () = orchestrator.run(&mut input) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    Ok(())
}
