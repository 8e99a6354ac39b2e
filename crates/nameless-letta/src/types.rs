use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A core-memory block: named, mutable text with a size limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    /// Null values from the backend are read as empty text.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Block {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            value: value.into(),
            limit: None,
            description: None,
        }
    }
}

/// An archival passage. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, alias = "metadata_")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl Passage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at: None,
            metadata: None,
            tags: None,
        }
    }
}

/// One result of a semantic search over archival memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageHit {
    pub passage: Passage,
    #[serde(default)]
    pub score: Option<f64>,
}

/// The subset of agent state this system reads back after import or for verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A message from the agent's history, discriminated by `message_type`.
///
/// Dates are kept as the backend renders them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum LettaMessage {
    SystemMessage {
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        seq_id: Option<i64>,
        #[serde(default)]
        content: Value,
    },
    UserMessage {
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        seq_id: Option<i64>,
        #[serde(default)]
        content: Value,
    },
    AssistantMessage {
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        seq_id: Option<i64>,
        #[serde(default)]
        content: Value,
    },
    ReasoningMessage {
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        seq_id: Option<i64>,
        #[serde(default)]
        reasoning: String,
    },
    HiddenReasoningMessage {
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        seq_id: Option<i64>,
        #[serde(default)]
        hidden_reasoning: Option<String>,
    },
    ToolCallMessage {
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        seq_id: Option<i64>,
        #[serde(default)]
        tool_call: Value,
    },
    ToolReturnMessage {
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        seq_id: Option<i64>,
        #[serde(default)]
        tool_return: Value,
        #[serde(default)]
        status: Option<String>,
    },
    /// Any kind this system does not interpret.
    #[serde(other)]
    Other,
}

impl LettaMessage {
    /// The backend's discriminator string.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::SystemMessage { .. } => "system_message",
            Self::UserMessage { .. } => "user_message",
            Self::AssistantMessage { .. } => "assistant_message",
            Self::ReasoningMessage { .. } => "reasoning_message",
            Self::HiddenReasoningMessage { .. } => "hidden_reasoning_message",
            Self::ToolCallMessage { .. } => "tool_call_message",
            Self::ToolReturnMessage { .. } => "tool_return_message",
            Self::Other => "other",
        }
    }

    pub fn date(&self) -> Option<&str> {
        match self {
            Self::SystemMessage { date, .. }
            | Self::UserMessage { date, .. }
            | Self::AssistantMessage { date, .. }
            | Self::ReasoningMessage { date, .. }
            | Self::HiddenReasoningMessage { date, .. }
            | Self::ToolCallMessage { date, .. }
            | Self::ToolReturnMessage { date, .. } => date.as_deref(),
            Self::Other => None,
        }
    }

    /// Readable content of the message, if it has any.
    pub fn content_text(&self) -> Option<String> {
        match self {
            Self::SystemMessage { content, .. }
            | Self::UserMessage { content, .. }
            | Self::AssistantMessage { content, .. } => Some(flatten_content(content)),
            Self::ReasoningMessage { reasoning, .. } => Some(reasoning.clone()),
            Self::ToolCallMessage { tool_call, .. } => Some(flatten_content(tool_call)),
            Self::ToolReturnMessage { tool_return, .. } => Some(flatten_content(tool_return)),
            Self::HiddenReasoningMessage { .. } | Self::Other => None,
        }
    }
}

/// Message content is either a plain string or a list of typed parts.
fn flatten_content(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|p| match p.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None => p.to_string(),
            })
            .collect::<Vec<_>>()
            .join(""),
        other => other.to_string(),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
