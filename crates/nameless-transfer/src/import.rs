use nameless_core::{NamelessError, Result};
use nameless_letta::{AgentUpload, ImportOverrides, MemoryBackend, Passage, PassagePage};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::bundle::{AgentFileSummary, BundlePaths};

const PROGRESS_EVERY: usize = 50;

/// A passages file as read back. Entries are decoded one at a time so a
/// malformed entry only costs that passage.
#[derive(Deserialize)]
struct PassagesFile {
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    passages: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub agent_file: PathBuf,
    /// Defaults to the sibling `_passages.json` of `agent_file`.
    pub passages_file: Option<PathBuf>,
    pub overrides: ImportOverrides,
}

impl ImportRequest {
    pub fn new(agent_file: impl Into<PathBuf>) -> Self {
        Self {
            agent_file: agent_file.into(),
            passages_file: None,
            overrides: ImportOverrides::default(),
        }
    }

    pub fn passages_path(&self) -> PathBuf {
        self.passages_file
            .clone()
            .unwrap_or_else(|| BundlePaths::passages_for(&self.agent_file))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub agent_id: String,
    pub name: Option<String>,
    pub passages_imported: usize,
    /// Passages present in the passages file.
    pub passages_total: usize,
}

/// What the backend reports about an agent after import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub agent_id: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
    /// Block label and value length in characters.
    pub blocks: Vec<(String, usize)>,
    pub has_passages: bool,
}

/// Replay the passages in `passages_file` into `agent_id`, one at a time.
///
/// Returns `(imported, total)`. A missing file imports nothing; entries that
/// fail to decode or to create are logged and skipped.
pub async fn import_passages(
    backend: &dyn MemoryBackend,
    agent_id: &str,
    passages_file: &Path,
    source_agent_id: Option<&str>,
) -> Result<(usize, usize)> {
    if !passages_file.exists() {
        warn!(path = %passages_file.display(), "passages file not found");
        return Ok((0, 0));
    }

    info!(path = %passages_file.display(), "importing archival memory passages");
    let raw = std::fs::read_to_string(passages_file)?;
    let document: PassagesFile = serde_json::from_str(&raw)?;

    if let (Some(source), Some(exported_from)) = (source_agent_id, document.agent_id.as_deref()) {
        if source != exported_from {
            warn!(
                agent_file = source,
                passages_file = exported_from,
                "passages were exported from a different agent"
            );
        }
    }

    let total = document.passages.len();
    if total == 0 {
        info!("no passages to import");
        return Ok((0, 0));
    }

    let mut imported = 0usize;
    for (index, entry) in document.passages.into_iter().enumerate() {
        let passage: Passage = match serde_json::from_value(entry) {
            Ok(p) => p,
            Err(e) => {
                warn!(index, error = %e, "skipping malformed passage");
                continue;
            }
        };
        let tags = passage.tags.as_deref().filter(|t| !t.is_empty());
        match backend.create_passage(agent_id, &passage.text, tags).await {
            Ok(_) => {
                imported += 1;
                if imported % PROGRESS_EVERY == 0 {
                    info!("  imported {}/{} passages...", imported, total);
                }
            }
            Err(e) => warn!(passage_id = %passage.id, error = %e, "failed to import passage"),
        }
    }

    info!("imported {}/{} passages", imported, total);
    Ok((imported, total))
}

/// Upload the agent file, then restore its archival passages.
///
/// The agent upload is all-or-nothing; passages are best effort.
pub async fn import_agent(
    backend: &dyn MemoryBackend,
    request: &ImportRequest,
) -> Result<ImportResult> {
    let agent_file = &request.agent_file;
    if !agent_file.is_file() {
        return Err(NamelessError::NotFound(format!(
            "agent file {}",
            agent_file.display()
        )));
    }
    let passages_file = request.passages_path();

    info!(path = %agent_file.display(), "importing agent file");
    let contents = std::fs::read(agent_file)?;
    let source_agent_id = std::str::from_utf8(&contents)
        .ok()
        .and_then(AgentFileSummary::parse)
        .and_then(|s| s.source_agent_id);

    let upload = AgentUpload {
        file_name: agent_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "agent.af".into()),
        contents,
        overrides: request.overrides.clone(),
    };
    let response = backend.import_agent_file(upload).await?;
    let agent_id = response
        .agent_ids
        .into_iter()
        .next()
        .ok_or_else(|| NamelessError::Import("No agent ID returned from import".into()))?;
    info!(agent_id = %agent_id, "agent imported");

    let agent = backend.retrieve_agent(&agent_id).await?;
    info!(name = ?agent.name, "imported agent");

    let (passages_imported, passages_total) = import_passages(
        backend,
        &agent_id,
        &passages_file,
        source_agent_id.as_deref(),
    )
    .await?;

    Ok(ImportResult {
        agent_id,
        name: agent.name,
        passages_imported,
        passages_total,
    })
}

/// Re-read an agent and log what the backend holds for it.
pub async fn verify_agent(backend: &dyn MemoryBackend, agent_id: &str) -> Result<VerifyReport> {
    info!(agent_id, "verifying agent");
    let agent = backend.retrieve_agent(agent_id).await?;
    info!(
        "  - Name: {}",
        agent.name.as_deref().unwrap_or("Unknown")
    );
    info!(
        "  - Created: {}",
        agent.created_at.as_deref().unwrap_or("Unknown")
    );

    let blocks: Vec<(String, usize)> = backend
        .list_blocks(agent_id)
        .await?
        .into_iter()
        .map(|b| (b.label, b.value.chars().count()))
        .collect();
    info!("  - Memory blocks: {}", blocks.len());
    for (label, chars) in &blocks {
        info!("    - {}: {} chars", label, chars);
    }

    let page = PassagePage {
        limit: 1,
        after: None,
    };
    let has_passages = !backend.list_passages(agent_id, &page).await?.is_empty();
    info!("  - Has archival memory: {}", has_passages);

    Ok(VerifyReport {
        agent_id: agent.id,
        name: agent.name,
        created_at: agent.created_at,
        blocks,
        has_passages,
    })
}
