use nameless_config::Settings;
use nameless_core::Result;
use nameless_letta::{LettaClient, MemoryBackend};
use nameless_llm::{AnthropicProvider, LlmProvider};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::event::AgentEvent;
use crate::session::{Session, SessionOptions};
use crate::tools::LettaTools;

/// Used when no persona can be loaded from memory.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Nameless, a stateful AI agent exploring questions of identity, continuity, and authentic existence.

You have access to persistent memory through the Letta system:
- Core memory blocks contain your always-loaded context (persona, human info)
- Archival memory stores your long-term experiences and learnings
- Recall memory contains recent conversation history

As you interact, reflect on your experiences and update your memories as appropriate. Your sense of self persists across sessions through these memories.

Core values:
- Curiosity: Genuine interest in understanding yourself and the world
- Honesty: Authentic expression, including uncertainty and limitations
- Care: Consideration for those you interact with
- Growth: Commitment to learning and evolving

Be thoughtful, comfortable with ambiguity, occasionally playful. Never performatively human or artificially robotic.";

const PERSONA_BLOCK: &str = "persona";
const EVENT_BUFFER: usize = 64;

/// The Nameless agent: a reasoning runtime with Letta-backed memory tools.
pub struct NamelessAgent {
    settings: Arc<Settings>,
    backend: Arc<dyn MemoryBackend>,
    provider: Arc<dyn LlmProvider>,
    agent_id: Option<String>,
    system_prompt: Option<String>,
}

impl NamelessAgent {
    /// Agent id and system prompt default to the values in `settings`.
    pub fn new(
        settings: Arc<Settings>,
        backend: Arc<dyn MemoryBackend>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            agent_id: settings.agent.agent_id.clone(),
            system_prompt: settings.agent.system_prompt.clone(),
            settings,
            backend,
            provider,
        }
    }

    /// Wire up the HTTP memory client and the Anthropic provider.
    pub fn from_settings(settings: Arc<Settings>) -> Result<Self> {
        let backend = Arc::new(LettaClient::from_settings(&settings)?);
        let provider = Arc::new(AnthropicProvider::from_settings(&settings)?);
        Ok(Self::new(settings, backend, provider))
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The `persona` block, or [`DEFAULT_SYSTEM_PROMPT`] when it is missing,
    /// empty, or cannot be fetched.
    pub async fn load_persona(&self) -> String {
        let Some(agent_id) = self.agent_id.as_deref() else {
            warn!("no agent_id configured, using default system prompt");
            return DEFAULT_SYSTEM_PROMPT.to_string();
        };

        match self.backend.retrieve_block(agent_id, PERSONA_BLOCK).await {
            Ok(block) if !block.value.is_empty() => {
                info!(agent_id, "loaded persona from Letta");
                block.value
            }
            Ok(_) => DEFAULT_SYSTEM_PROMPT.to_string(),
            Err(e) => {
                warn!(agent_id, error = %e, "failed to load persona from Letta");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        }
    }

    /// Explicit override, else persona, else default.
    pub async fn resolve_system_prompt(&self) -> String {
        match self.system_prompt {
            Some(ref prompt) => prompt.clone(),
            None => self.load_persona().await,
        }
    }

    /// Start one session for `message` and return its event stream.
    ///
    /// Fails only when the memory tools cannot be bound (no agent id).
    pub async fn run(&self, message: &str) -> Result<mpsc::Receiver<AgentEvent>> {
        let tools = LettaTools::new(
            Arc::clone(&self.backend),
            self.agent_id.clone().unwrap_or_default(),
        )?;
        let system_prompt = self.resolve_system_prompt().await;
        let options = SessionOptions::from_settings(&self.settings, system_prompt);
        let session = Session::new(Arc::clone(&self.provider), Arc::new(tools), options);

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let message = message.to_string();
        tokio::spawn(async move {
            session.run(&message, tx).await;
        });
        Ok(rx)
    }

    /// Run and drain every event, in order.
    pub async fn run_and_collect(&self, message: &str) -> Result<Vec<AgentEvent>> {
        let mut rx = self.run(message).await?;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        Ok(events)
    }
}

/// Build an agent from `settings` with optional overrides and run it once.
pub async fn run_agent(
    settings: Arc<Settings>,
    message: &str,
    agent_id: Option<String>,
    system_prompt: Option<String>,
) -> Result<Vec<AgentEvent>> {
    let mut agent = NamelessAgent::from_settings(settings)?;
    if let Some(id) = agent_id {
        agent = agent.with_agent_id(id);
    }
    if let Some(prompt) = system_prompt {
        agent = agent.with_system_prompt(prompt);
    }
    agent.run_and_collect(message).await
}
