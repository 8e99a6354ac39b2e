use nameless_llm::{StopReason, Usage};
use serde::Serialize;
use serde_json::Value;

/// One event in the stream produced by a reasoning session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Assistant text for one turn.
    Text { text: String },
    /// The model asked for a tool.
    ToolUse { id: String, name: String, input: Value },
    /// Outcome of a tool call, as fed back to the model.
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
    /// The session finished.
    Result {
        stop_reason: StopReason,
        iterations: u32,
        usage: Usage,
    },
    /// The session ended early.
    Error { message: String },
}

impl AgentEvent {
    pub fn text(&self) -> Option<&str> {
        match self {
            AgentEvent::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Result { .. } | AgentEvent::Error { .. })
    }
}
