//! Orchestration Loop
//!
//! Drives one conversation: read user text, let the model answer (running any
//! tools it asks for), ask the completion judge whether the answer is done, and
//! either continue on its own or hand back to the user. The loop guard caps the
//! number of automatic steps between two user inputs.
//!
//! ```text
//! AwaitingUserInput ──► ModelTurn ──► (tool calls) ──► CompletionCheck
//!        ▲                 ▲                               │
//!        │                 └──────── INCOMPLETE ───────────┤
//!        └──────────────── COMPLETE ───────────────────────┘
//!
//! guard exhausted / in-loop error ──► ForcedUserInput ──► ModelTurn
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::gateway::{ServerInfo, SessionGateway};
use crate::guard::DEFAULT_MAX_LOOPS;
use crate::input::{UserInput, is_quit};
use crate::invoker::ToolInvoker;
use crate::judge::{COMPLETION_CHECK_PROMPT, CompletionJudge, Verdict};
use crate::message::{Conversation, Message};
use crate::provider::{ContentBlock, GenerationOptions, LlmProvider, ModelResponse};
use crate::session::ChatSession;
use crate::tool::ToolCatalog;
use crate::transcript::{Notice, NullTranscript, TranscriptSink};

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant with access to various tools.
Be helpful and brief in your responses.
Only use tools when needed and verify you have all required information first.
Before calling a tool, do some analysis within <thinking></thinking> tags.
Place all user-facing conversational responses in <reply></reply> XML tags."#;

const FOLLOW_UP_PREFIX: &str = "Your previous reply was judged incomplete. Continue the task without waiting for the user. Reviewer note: ";

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub system_prompt: String,

    /// Ephemeral instruction given to the completion judge
    pub judge_instruction: String,

    /// Automatic turns allowed between two user inputs
    pub max_loops: u32,

    /// Re-list tools before every model turn
    pub refresh_catalog: bool,

    /// Pause before the single retry of a rate-limited model call
    pub retry_delay: Duration,

    pub generation: GenerationOptions,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            judge_instruction: COMPLETION_CHECK_PROMPT.into(),
            max_loops: DEFAULT_MAX_LOOPS,
            refresh_catalog: false,
            retry_delay: Duration::from_secs(2),
            generation: GenerationOptions::default(),
        }
    }
}

/// Where the loop is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingUserInput,
    ModelTurn,
    CompletionCheck,
    /// Loop guard exhausted; only user text gets us out
    ForcedUserInput,
    Finished,
}

pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    gateway: Arc<dyn SessionGateway>,
    invoker: ToolInvoker,
    judge: CompletionJudge,
    catalog: ToolCatalog,
    session: ChatSession,
    config: OrchestratorConfig,
    transcript: Arc<dyn TranscriptSink>,
    phase: Phase,
    follow_up: Option<String>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        gateway: Arc<dyn SessionGateway>,
        config: OrchestratorConfig,
    ) -> Self {
        let judge = CompletionJudge::new(
            provider.clone(),
            config.system_prompt.clone(),
            config.generation.clone(),
        )
        .with_instruction(config.judge_instruction.clone());

        Self {
            invoker: ToolInvoker::new(gateway.clone()),
            judge,
            catalog: ToolCatalog::default(),
            session: ChatSession::new(config.max_loops),
            provider,
            gateway,
            config,
            transcript: Arc::new(NullTranscript),
            phase: Phase::AwaitingUserInput,
            follow_up: None,
        }
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptSink>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Handshake with the gateway and take the first catalog snapshot.
    /// Any failure here is a connection error.
    pub async fn connect(&mut self) -> Result<ServerInfo> {
        let info = self
            .gateway
            .initialize()
            .await
            .map_err(|e| AgentError::Connection(e.to_string()))?;
        self.refresh_catalog()
            .await
            .map_err(|e| AgentError::Connection(e.to_string()))?;

        tracing::info!(server = %info.name, tools = ?self.catalog.names(), "Connected to server");
        Ok(info)
    }

    pub async fn refresh_catalog(&mut self) -> Result<()> {
        self.catalog = ToolCatalog::new(self.gateway.list_tools().await?);
        Ok(())
    }

    /// Run until the user quits or input closes. In-loop failures never end the run.
    pub async fn run(&mut self, input: &mut dyn UserInput) {
        tracing::info!(session = %self.session.id, max_loops = self.session.guard.max(), "Chat started");

        while self.phase != Phase::Finished {
            if self.session.guard.is_exhausted()
                && matches!(self.phase, Phase::ModelTurn | Phase::CompletionCheck)
            {
                tracing::info!("Reached maximum number of consecutive responses. Requesting user input.");
                self.transcript.notice(&Notice::LoopLimit {
                    max: self.session.guard.max(),
                });
                self.phase = Phase::ForcedUserInput;
            }

            match self.phase {
                Phase::AwaitingUserInput | Phase::ForcedUserInput => self.await_user(input).await,
                Phase::ModelTurn => {
                    if let Err(e) = self.model_turn().await {
                        self.record_failure(&e);
                    }
                }
                Phase::CompletionCheck => {
                    if let Err(e) = self.completion_check().await {
                        self.record_failure(&e);
                    }
                }
                Phase::Finished => {}
            }
        }

        self.session.end();
        tracing::info!(
            session = %self.session.id,
            messages = self.session.message_count(),
            "Chat ended"
        );
    }

    async fn await_user(&mut self, input: &mut dyn UserInput) {
        let Some(line) = input.next_line().await else {
            self.phase = Phase::Finished;
            return;
        };
        if is_quit(&line) {
            self.phase = Phase::Finished;
            return;
        }
        // blank lines re-prompt
        if line.trim().is_empty() {
            return;
        }

        self.append(Message::user(line.trim()));
        self.session.guard.reset();
        self.follow_up = None;
        self.phase = Phase::ModelTurn;
    }

    /// One model call, running its tool requests in emitted order
    async fn model_turn(&mut self) -> Result<()> {
        if self.config.refresh_catalog {
            self.refresh_catalog().await?;
        }

        let system = match self.follow_up.take() {
            Some(note) => format!("{}\n\n{FOLLOW_UP_PREFIX}{note}", self.config.system_prompt),
            None => self.config.system_prompt.clone(),
        };

        let response = match self.invoke_model(&system).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, delay = ?self.config.retry_delay, "Model call failed, retrying once");
                tokio::time::sleep(self.config.retry_delay).await;
                self.invoke_model(&system).await?
            }
            other => other?,
        };

        for block in response.content {
            match block {
                ContentBlock::Text { text } => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    tracing::info!("Assistant: {text}");
                    self.append(Message::assistant(text));
                }
                ContentBlock::ToolUse(request) => {
                    self.append(Message::tool_use(request.clone()));
                    let payload = self.invoker.execute(&request, &self.catalog).await;
                    self.append(Message::tool_result(request.id, payload));
                }
            }
        }

        self.session.guard.increment();
        self.phase = if self.session.conversation().ends_with_assistant_reply() {
            Phase::CompletionCheck
        } else {
            Phase::ModelTurn
        };
        Ok(())
    }

    async fn invoke_model(&self, system: &str) -> Result<ModelResponse> {
        self.provider
            .invoke(
                self.session.conversation().messages(),
                Some(system),
                Some(self.catalog.tools()),
                &self.config.generation,
            )
            .await
    }

    async fn completion_check(&mut self) -> Result<()> {
        match self.judge.assess(self.session.conversation()).await? {
            Verdict::Complete { .. } => {
                self.phase = Phase::AwaitingUserInput;
            }
            Verdict::Incomplete { note } => {
                tracing::info!("Follow-up: {note}");
                self.transcript.notice(&Notice::FollowUp(note.clone()));
                self.session.guard.increment();
                self.follow_up = Some(note);
                self.phase = Phase::ModelTurn;
            }
        }
        Ok(())
    }

    /// Record the failure in the conversation and force a human checkpoint
    fn record_failure(&mut self, err: &AgentError) {
        tracing::error!(error = %err, "Error in conversation loop");
        self.append(Message::system_error(format!(
            "Error occurred: {err}. Please try again."
        )));
        self.transcript.notice(&Notice::Error(err.user_message()));
        self.session.guard.exhaust();
    }

    fn append(&mut self, message: Message) {
        self.transcript.message(&message);
        self.session.append(message);
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn conversation(&self) -> &Conversation {
        self.session.conversation()
    }

    pub const fn session(&self) -> &ChatSession {
        &self.session
    }

    pub const fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

/// Builder for an [`Orchestrator`]
pub struct OrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    gateway: Option<Arc<dyn SessionGateway>>,
    transcript: Option<Arc<dyn TranscriptSink>>,
    config: OrchestratorConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            gateway: None,
            transcript: None,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn SessionGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn transcript(mut self, transcript: Arc<dyn TranscriptSink>) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    pub const fn max_loops(mut self, max: u32) -> Self {
        self.config.max_loops = max;
        self
    }

    pub const fn refresh_catalog(mut self, refresh: bool) -> Self {
        self.config.refresh_catalog = refresh;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let gateway = self
            .gateway
            .ok_or_else(|| AgentError::Config("Session gateway is required".into()))?;

        let orchestrator = Orchestrator::new(provider, gateway, self.config);
        Ok(match self.transcript {
            Some(transcript) => orchestrator.with_transcript(transcript),
            None => orchestrator,
        })
    }
}
