use async_trait::async_trait;
use nameless_core::Result;
use serde::{Deserialize, Serialize};

use crate::types::{AgentSummary, Block, LettaMessage, Passage, PassageHit};

/// Cursor-paginated passage listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassagePage {
    pub limit: usize,
    /// Id of the last passage of the previous page.
    pub after: Option<String>,
}

/// Optional fields overriding the uploaded agent file's own settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOverrides {
    pub name: Option<String>,
    pub model: Option<String>,
    pub embedding: Option<String>,
}

/// An agent-state document to upload.
#[derive(Debug, Clone)]
pub struct AgentUpload {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub overrides: ImportOverrides,
}

/// Response of an agent-file import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub agent_ids: Vec<String>,
}

/// Memory backend operations. Each call is a live round trip.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    async fn retrieve_block(&self, agent_id: &str, label: &str) -> Result<Block>;

    async fn update_block(&self, agent_id: &str, label: &str, value: &str) -> Result<Block>;

    async fn list_blocks(&self, agent_id: &str) -> Result<Vec<Block>>;

    /// Semantic search; ranking happens inside the backend.
    async fn search_passages(
        &self,
        agent_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<PassageHit>>;

    async fn create_passage(
        &self,
        agent_id: &str,
        text: &str,
        tags: Option<&[String]>,
    ) -> Result<Vec<Passage>>;

    async fn list_passages(&self, agent_id: &str, page: &PassagePage) -> Result<Vec<Passage>>;

    async fn list_messages(&self, agent_id: &str, limit: usize) -> Result<Vec<LettaMessage>>;

    async fn retrieve_agent(&self, agent_id: &str) -> Result<AgentSummary>;

    /// The serialized agent-state document, verbatim.
    async fn export_agent_file(&self, agent_id: &str) -> Result<String>;

    async fn import_agent_file(&self, upload: AgentUpload) -> Result<ImportResponse>;
}
