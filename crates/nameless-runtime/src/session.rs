use nameless_config::Settings;
use nameless_core::{
    Message, NamelessError, Role, SessionId, Tool, ToolCall, ToolExecutor, ToolResult,
};
use nameless_llm::{LlmProvider, LlmRequest, StopReason, Usage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::AgentEvent;

/// Per-session model parameters and tool allow-list.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model: String,
    pub system_prompt: String,
    /// Only these tool names are offered to, and executed for, the model.
    pub allowed_tools: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_iterations: u32,
}

impl SessionOptions {
    pub fn from_settings(settings: &Settings, system_prompt: String) -> Self {
        Self {
            model: settings.agent.model.clone(),
            system_prompt,
            allowed_tools: crate::tools::TOOL_NAMES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            max_tokens: settings.agent.max_tokens,
            temperature: settings.agent.temperature,
            max_iterations: settings.agent.max_iterations,
        }
    }
}

/// A single reasoning session. Consumed by [`Session::run`]; never reused.
pub struct Session {
    id: SessionId,
    provider: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolExecutor>,
    options: SessionOptions,
    messages: Vec<Message>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolExecutor>,
        options: SessionOptions,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            provider,
            tools,
            options,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    fn is_allowed(&self, name: &str) -> bool {
        self.options.allowed_tools.iter().any(|t| t == name)
    }

    fn offered_tools(&self) -> Vec<Tool> {
        self.tools
            .tools()
            .into_iter()
            .filter(|t| self.is_allowed(&t.name))
            .collect()
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        if !self.is_allowed(&call.tool_name) {
            let err = NamelessError::ToolDenied {
                tool: call.tool_name.clone(),
            };
            warn!(tool = %call.tool_name, "tool call outside allow-list");
            return ToolResult::error(call.id.clone(), err.to_string());
        }
        match self.tools.execute(call).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.tool_name, error = %e, "tool call failed");
                ToolResult::error(call.id.clone(), e.to_string())
            }
        }
    }

    /// Forward one event. Returns false once the receiver is gone.
    async fn emit(&self, tx: &mpsc::Sender<AgentEvent>, event: AgentEvent) -> bool {
        if tx.send(event).await.is_err() {
            debug!(session_id = %self.id, "event receiver dropped, stopping session");
            return false;
        }
        true
    }

    /// Send `prompt` and stream events into `tx` until the model stops
    /// calling tools, the turn limit is reached, or the provider fails.
    /// A dropped receiver ends the session before any further tool runs.
    pub async fn run(mut self, prompt: &str, tx: mpsc::Sender<AgentEvent>) {
        info!(session_id = %self.id, model = %self.options.model, "session started");
        self.messages
            .push(Message::text(self.id, Role::User, prompt));

        let tools = self.offered_tools();
        let mut usage = Usage::default();
        let mut iterations = 0u32;

        let stop_reason = loop {
            if iterations >= self.options.max_iterations {
                warn!(session_id = %self.id, iterations, "turn limit reached");
                break StopReason::MaxIterations;
            }
            iterations += 1;

            let request = LlmRequest {
                model: self.options.model.clone(),
                messages: self.messages.clone(),
                tools: tools.clone(),
                system: Some(self.options.system_prompt.clone()),
                max_tokens: self.options.max_tokens,
                temperature: self.options.temperature,
            };

            let response = match self.provider.complete(&request).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "provider call failed");
                    self.emit(
                        &tx,
                        AgentEvent::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
                    return;
                }
            };
            usage.merge(&response.usage);

            let text = response.message.text_content();
            if !text.is_empty() && !self.emit(&tx, AgentEvent::Text { text }).await {
                return;
            }

            let calls = response.message.tool_calls.clone();
            for call in &calls {
                let event = AgentEvent::ToolUse {
                    id: call.id.clone(),
                    name: call.tool_name.clone(),
                    input: call.arguments.clone(),
                };
                if !self.emit(&tx, event).await {
                    return;
                }
            }

            let mut reply = response.message;
            reply.session_id = self.id;
            self.messages.push(reply);

            if calls.is_empty() {
                break response.stop_reason;
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = self.execute(call).await;
                debug!(tool = %call.tool_name, is_error = result.is_error, "tool result");
                let event = AgentEvent::ToolResult {
                    tool_use_id: result.tool_call_id.clone(),
                    content: result.content.clone(),
                    is_error: result.is_error,
                };
                if !self.emit(&tx, event).await {
                    return;
                }
                results.push(result);
            }
            self.messages
                .push(Message::tool_results(self.id, &results));
        };

        info!(
            session_id = %self.id,
            iterations,
            tokens = usage.total_tokens(),
            "session finished"
        );
        self.emit(
            &tx,
            AgentEvent::Result {
                stop_reason,
                iterations,
                usage,
            },
        )
        .await;
    }
}
