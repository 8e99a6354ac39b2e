use chrono::{DateTime, Local};
use nameless_core::Result;
use nameless_letta::{MemoryBackend, Passage, PassagePage};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::bundle::{AgentFileSummary, BundlePaths, PassagesDocument, write_atomic};

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub agent_id: String,
    pub output_dir: PathBuf,
    /// Filename prefix of the bundle.
    pub prefix: String,
    pub page_size: usize,
    /// Fixed bundle timestamp; defaults to now.
    pub timestamp: Option<DateTime<Local>>,
}

impl ExportRequest {
    pub fn new(agent_id: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent_id: agent_id.into(),
            output_dir: output_dir.into(),
            prefix: "nameless".into(),
            page_size: DEFAULT_PAGE_SIZE,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub agent_file_path: PathBuf,
    pub passages_file_path: PathBuf,
    pub agent_id: String,
    pub passage_count: usize,
    /// Absent when the agent file could not be parsed.
    pub message_count: Option<usize>,
    pub block_count: Option<usize>,
}

/// Fetch every archival passage, following the `after` cursor until a
/// short or empty page.
pub async fn export_passages(
    backend: &dyn MemoryBackend,
    agent_id: &str,
    page_size: usize,
) -> Result<Vec<Passage>> {
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut page = PassagePage {
        limit: page_size,
        after: None,
    };

    loop {
        let batch = backend.list_passages(agent_id, &page).await?;
        debug!(agent_id, fetched = batch.len(), after = ?page.after, "passage page");
        let done = batch.len() < page_size;
        page.after = batch.last().map(|p| p.id.clone());
        all.extend(batch);
        if done {
            break;
        }
    }
    Ok(all)
}

/// Export the agent-state document and all archival passages into a
/// timestamped bundle under `request.output_dir`.
pub async fn export_agent(
    backend: &dyn MemoryBackend,
    request: &ExportRequest,
) -> Result<ExportResult> {
    std::fs::create_dir_all(&request.output_dir)?;
    let timestamp = request.timestamp.unwrap_or_else(Local::now);
    let paths = BundlePaths::for_export(&request.output_dir, &request.prefix, timestamp);
    let agent_id = request.agent_id.as_str();

    info!(agent_id, "exporting agent file");
    let agent_file = backend.export_agent_file(agent_id).await?;
    write_atomic(&paths.agent_file, agent_file.as_bytes())?;
    info!(path = %paths.agent_file.display(), "agent file exported");

    let summary = match AgentFileSummary::parse(&agent_file) {
        Some(s) => {
            info!(
                messages = ?s.message_count,
                blocks = ?s.block_count,
                tools = ?s.tool_count,
                "agent file summary"
            );
            s
        }
        None => {
            warn!("could not parse agent file for summary");
            AgentFileSummary::default()
        }
    };

    info!(agent_id, "exporting archival memory passages");
    let passages = export_passages(backend, agent_id, request.page_size).await?;
    let passage_count = passages.len();
    let document = PassagesDocument {
        agent_id: agent_id.to_string(),
        passages,
    };
    write_atomic(
        &paths.passages_file,
        serde_json::to_string_pretty(&document)?.as_bytes(),
    )?;
    info!(count = passage_count, path = %paths.passages_file.display(), "passages exported");

    Ok(ExportResult {
        agent_file_path: paths.agent_file,
        passages_file_path: paths.passages_file,
        agent_id: agent_id.to_string(),
        passage_count,
        message_count: summary.message_count,
        block_count: summary.block_count,
    })
}
