//! In-memory memory backend for deterministic testing.
//!
//! Seeded with blocks, passages, messages and an agent-file payload; records
//! the calls the pipelines make so tests can assert on them.

use async_trait::async_trait;
use nameless_core::{NamelessError, Result};
use parking_lot::Mutex;

use crate::backend::*;
use crate::types::*;

/// A passage creation as seen by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPassage {
    pub agent_id: String,
    pub text: String,
    pub tags: Option<Vec<String>>,
}

#[derive(Default)]
struct MockState {
    blocks: Vec<Block>,
    passages: Vec<Passage>,
    search_hits: Vec<PassageHit>,
    messages: Vec<LettaMessage>,
    agent_name: Option<String>,
    agent_created_at: Option<String>,
    agent_file: String,
    import_ids: Vec<String>,

    fail_block_retrieve: bool,
    fail_every_nth_create: Option<usize>,

    create_attempts: usize,
    page_requests: Vec<PassagePage>,
    created: Vec<CreatedPassage>,
    uploads: Vec<AgentUpload>,
    block_updates: Vec<(String, String)>,
}

/// A `MemoryBackend` that never leaves the process.
///
/// # Example
/// ```
/// use nameless_letta::MockBackend;
/// let backend = MockBackend::new()
///     .with_block("persona", "I am Nameless.")
///     .with_import_ids(vec!["agent-new".into()]);
/// ```
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(self, label: &str, value: &str) -> Self {
        self.state.lock().blocks.push(Block::new(label, value));
        self
    }

    pub fn with_passages(self, passages: Vec<Passage>) -> Self {
        self.state.lock().passages.extend(passages);
        self
    }

    /// Seed `count` passages with ids `passage-0..count`.
    pub fn with_numbered_passages(self, count: usize) -> Self {
        let passages = (0..count)
            .map(|i| Passage::new(format!("passage-{i}"), format!("memory #{i}")))
            .collect();
        self.with_passages(passages)
    }

    pub fn with_search_hit(self, text: &str, score: f64) -> Self {
        let mut state = self.state.lock();
        let id = format!("hit-{}", state.search_hits.len());
        state.search_hits.push(PassageHit {
            passage: Passage::new(id, text),
            score: Some(score),
        });
        drop(state);
        self
    }

    pub fn with_messages(self, messages: Vec<LettaMessage>) -> Self {
        self.state.lock().messages.extend(messages);
        self
    }

    pub fn with_agent_name(self, name: &str) -> Self {
        self.state.lock().agent_name = Some(name.to_string());
        self
    }

    pub fn with_agent_created_at(self, created_at: &str) -> Self {
        self.state.lock().agent_created_at = Some(created_at.to_string());
        self
    }

    pub fn with_agent_file(self, contents: &str) -> Self {
        self.state.lock().agent_file = contents.to_string();
        self
    }

    pub fn with_import_ids(self, ids: Vec<String>) -> Self {
        self.state.lock().import_ids = ids;
        self
    }

    /// Every block retrieval fails with HTTP 500.
    pub fn failing_block_retrieve(self) -> Self {
        self.state.lock().fail_block_retrieve = true;
        self
    }

    /// Every `n`-th passage creation (1-based) fails with HTTP 500.
    pub fn failing_every_nth_create(self, n: usize) -> Self {
        self.state.lock().fail_every_nth_create = Some(n);
        self
    }

    // ── Recorded calls ─────────────────────────────────────────

    pub fn page_requests(&self) -> Vec<PassagePage> {
        self.state.lock().page_requests.clone()
    }

    pub fn created_passages(&self) -> Vec<CreatedPassage> {
        self.state.lock().created.clone()
    }

    pub fn create_attempts(&self) -> usize {
        self.state.lock().create_attempts
    }

    pub fn uploads(&self) -> Vec<AgentUpload> {
        self.state.lock().uploads.clone()
    }

    pub fn block_updates(&self) -> Vec<(String, String)> {
        self.state.lock().block_updates.clone()
    }

    pub fn block_value(&self, label: &str) -> Option<String> {
        self.state
            .lock()
            .blocks
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.value.clone())
    }
}

fn not_found(what: &str) -> NamelessError {
    NamelessError::Backend {
        status: 404,
        body: format!("{what} not found"),
    }
}

#[async_trait]
impl MemoryBackend for MockBackend {
    async fn retrieve_block(&self, _agent_id: &str, label: &str) -> Result<Block> {
        let state = self.state.lock();
        if state.fail_block_retrieve {
            return Err(NamelessError::Backend {
                status: 500,
                body: "block retrieval failed".into(),
            });
        }
        state
            .blocks
            .iter()
            .find(|b| b.label == label)
            .cloned()
            .ok_or_else(|| not_found(&format!("block '{label}'")))
    }

    async fn update_block(&self, _agent_id: &str, label: &str, value: &str) -> Result<Block> {
        let mut state = self.state.lock();
        state
            .block_updates
            .push((label.to_string(), value.to_string()));
        let block = state
            .blocks
            .iter_mut()
            .find(|b| b.label == label)
            .ok_or_else(|| not_found(&format!("block '{label}'")))?;
        block.value = value.to_string();
        Ok(block.clone())
    }

    async fn list_blocks(&self, _agent_id: &str) -> Result<Vec<Block>> {
        Ok(self.state.lock().blocks.clone())
    }

    async fn search_passages(
        &self,
        _agent_id: &str,
        _query: &str,
        top_k: usize,
    ) -> Result<Vec<PassageHit>> {
        Ok(self
            .state
            .lock()
            .search_hits
            .iter()
            .take(top_k)
            .cloned()
            .collect())
    }

    async fn create_passage(
        &self,
        agent_id: &str,
        text: &str,
        tags: Option<&[String]>,
    ) -> Result<Vec<Passage>> {
        let mut state = self.state.lock();
        state.create_attempts += 1;
        if let Some(n) = state.fail_every_nth_create {
            if n > 0 && state.create_attempts % n == 0 {
                return Err(NamelessError::Backend {
                    status: 500,
                    body: format!("create #{} rejected", state.create_attempts),
                });
            }
        }

        state.created.push(CreatedPassage {
            agent_id: agent_id.to_string(),
            text: text.to_string(),
            tags: tags.map(<[String]>::to_vec),
        });
        let mut passage = Passage::new(format!("passage-new-{}", state.created.len()), text);
        passage.tags = tags.map(<[String]>::to_vec);
        state.passages.push(passage.clone());
        Ok(vec![passage])
    }

    async fn list_passages(&self, _agent_id: &str, page: &PassagePage) -> Result<Vec<Passage>> {
        let mut state = self.state.lock();
        state.page_requests.push(page.clone());
        let start = match page.after {
            Some(ref after) => state
                .passages
                .iter()
                .position(|p| &p.id == after)
                .map(|i| i + 1)
                .unwrap_or(state.passages.len()),
            None => 0,
        };
        Ok(state
            .passages
            .iter()
            .skip(start)
            .take(page.limit)
            .cloned()
            .collect())
    }

    async fn list_messages(&self, _agent_id: &str, limit: usize) -> Result<Vec<LettaMessage>> {
        Ok(self
            .state
            .lock()
            .messages
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn retrieve_agent(&self, agent_id: &str) -> Result<AgentSummary> {
        let state = self.state.lock();
        Ok(AgentSummary {
            id: agent_id.to_string(),
            name: state.agent_name.clone(),
            created_at: state.agent_created_at.clone(),
        })
    }

    async fn export_agent_file(&self, _agent_id: &str) -> Result<String> {
        Ok(self.state.lock().agent_file.clone())
    }

    async fn import_agent_file(&self, upload: AgentUpload) -> Result<ImportResponse> {
        let mut state = self.state.lock();
        state.uploads.push(upload);
        Ok(ImportResponse {
            agent_ids: state.import_ids.clone(),
        })
    }
}
