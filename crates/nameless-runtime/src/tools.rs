use async_trait::async_trait;
use nameless_config::Settings;
use nameless_core::{
    NamelessError, Result, Tool, ToolCall, ToolExecutor, ToolResult, truncate_chars,
};
use nameless_letta::MemoryBackend;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info};

/// Names of the memory tools, in registration order.
pub const TOOL_NAMES: [&str; 6] = [
    "get_memory_block",
    "update_memory_block",
    "search_archival_memory",
    "insert_archival_memory",
    "list_memory_blocks",
    "get_recent_messages",
];

const DEFAULT_COUNT: usize = 10;
const MESSAGE_PREVIEW_CHARS: usize = 500;

/// Memory operations exposed to the model, bound to one agent.
#[derive(Clone)]
pub struct LettaTools {
    backend: Arc<dyn MemoryBackend>,
    agent_id: String,
}

impl LettaTools {
    pub fn new(backend: Arc<dyn MemoryBackend>, agent_id: impl Into<String>) -> Result<Self> {
        let agent_id = agent_id.into();
        if agent_id.is_empty() {
            return Err(NamelessError::Config(
                "No agent_id provided and NAMELESS_AGENT_ID not set".into(),
            ));
        }
        Ok(Self { backend, agent_id })
    }

    /// Bind to the agent configured in `settings`.
    pub fn from_settings(backend: Arc<dyn MemoryBackend>, settings: &Settings) -> Result<Self> {
        Self::new(backend, settings.agent.agent_id.clone().unwrap_or_default())
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub async fn get_memory_block(&self, block_name: &str) -> Result<String> {
        let block = self.backend.retrieve_block(&self.agent_id, block_name).await?;
        Ok(block.value)
    }

    pub async fn update_memory_block(&self, block_name: &str, value: &str) -> Result<String> {
        self.backend
            .update_block(&self.agent_id, block_name, value)
            .await?;
        info!(block = block_name, "memory block updated");
        Ok(format!("Updated memory block '{}'", block_name))
    }

    pub async fn search_archival_memory(&self, query: &str, count: usize) -> Result<String> {
        let hits = self
            .backend
            .search_passages(&self.agent_id, query, count)
            .await?;
        let entries: Vec<Value> = hits
            .iter()
            .map(|h| json!({ "text": h.passage.text, "score": h.score }))
            .collect();
        Ok(serde_json::to_string(&entries)?)
    }

    pub async fn insert_archival_memory(&self, text: &str) -> Result<String> {
        self.backend
            .create_passage(&self.agent_id, text, None)
            .await?;
        info!(chars = text.chars().count(), "archival memory inserted");
        Ok("Memory archived successfully".into())
    }

    pub async fn list_memory_blocks(&self) -> Result<String> {
        let blocks = self.backend.list_blocks(&self.agent_id).await?;
        let entries: Vec<Value> = blocks
            .iter()
            .map(|b| json!({ "label": b.label, "value_length": b.value.chars().count() }))
            .collect();
        Ok(serde_json::to_string(&entries)?)
    }

    pub async fn get_recent_messages(&self, count: usize) -> Result<String> {
        let messages = self.backend.list_messages(&self.agent_id, count).await?;
        let entries: Vec<Value> = messages
            .iter()
            .map(|m| {
                let mut entry = Map::new();
                entry.insert("type".into(), json!(m.message_type()));
                if let Some(content) = m.content_text() {
                    entry.insert(
                        "content".into(),
                        json!(truncate_chars(&content, MESSAGE_PREVIEW_CHARS)),
                    );
                }
                if let Some(date) = m.date() {
                    entry.insert("date".into(), json!(date));
                }
                Value::Object(entry)
            })
            .collect();
        Ok(serde_json::to_string(&entries)?)
    }
}

fn str_arg<'a>(call: &'a ToolCall, key: &str) -> Result<&'a str> {
    call.arguments[key]
        .as_str()
        .ok_or_else(|| NamelessError::ToolExecution {
            tool: call.tool_name.clone(),
            reason: format!("missing '{}' argument", key),
        })
}

fn count_arg(call: &ToolCall) -> usize {
    call.arguments["count"]
        .as_u64()
        .map(|c| c as usize)
        .unwrap_or(DEFAULT_COUNT)
}

#[async_trait]
impl ToolExecutor for LettaTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "get_memory_block".into(),
                description: "Get a core memory block by name (e.g. 'persona', 'human').".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "block_name": { "type": "string", "description": "Block label" }
                    },
                    "required": ["block_name"]
                }),
                is_mutating: false,
            },
            Tool {
                name: "update_memory_block".into(),
                description: "Update a core memory block value.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "block_name": { "type": "string", "description": "Block label" },
                        "value": { "type": "string", "description": "New block value" }
                    },
                    "required": ["block_name", "value"]
                }),
                is_mutating: true,
            },
            Tool {
                name: "search_archival_memory".into(),
                description: "Search archival memory for past experiences.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "What to look for" },
                        "count": { "type": "integer", "description": "Maximum results (default 10)" }
                    },
                    "required": ["query"]
                }),
                is_mutating: false,
            },
            Tool {
                name: "insert_archival_memory".into(),
                description: "Store a new entry in archival memory.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "text": { "type": "string", "description": "Text to remember" }
                    },
                    "required": ["text"]
                }),
                is_mutating: true,
            },
            Tool {
                name: "list_memory_blocks".into(),
                description: "List all available core memory blocks.".into(),
                parameters: json!({ "type": "object", "properties": {} }),
                is_mutating: false,
            },
            Tool {
                name: "get_recent_messages".into(),
                description: "Get recent conversation messages.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "count": { "type": "integer", "description": "Number of messages (default 10)" }
                    }
                }),
                is_mutating: false,
            },
        ]
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        debug!(tool = %call.tool_name, agent_id = %self.agent_id, "executing memory tool");
        let output = match call.tool_name.as_str() {
            "get_memory_block" => self.get_memory_block(str_arg(call, "block_name")?).await?,
            "update_memory_block" => {
                let block_name = str_arg(call, "block_name")?;
                let value = str_arg(call, "value")?;
                self.update_memory_block(block_name, value).await?
            }
            "search_archival_memory" => {
                self.search_archival_memory(str_arg(call, "query")?, count_arg(call))
                    .await?
            }
            "insert_archival_memory" => self.insert_archival_memory(str_arg(call, "text")?).await?,
            "list_memory_blocks" => self.list_memory_blocks().await?,
            "get_recent_messages" => self.get_recent_messages(count_arg(call)).await?,
            _ => return Err(NamelessError::ToolNotFound(call.tool_name.clone())),
        };
        Ok(ToolResult::text(call.id.clone(), output))
    }
}
