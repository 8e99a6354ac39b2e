use chrono::{DateTime, Local};
use nameless_core::Result;
use nameless_letta::Passage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const AGENT_FILE_EXT: &str = ".af";
pub const PASSAGES_SUFFIX: &str = "_passages.json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// The two files of one export bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub agent_file: PathBuf,
    pub passages_file: PathBuf,
}

impl BundlePaths {
    /// `<dir>/<prefix>_<YYYYMMDD_HHMMSS>.af` and its `_passages.json` sibling.
    pub fn for_export(output_dir: &Path, prefix: &str, timestamp: DateTime<Local>) -> Self {
        let stem = format!("{}_{}", prefix, timestamp.format(TIMESTAMP_FORMAT));
        Self {
            agent_file: output_dir.join(format!("{stem}{AGENT_FILE_EXT}")),
            passages_file: output_dir.join(format!("{stem}{PASSAGES_SUFFIX}")),
        }
    }

    /// The passages file paired with `agent_file` by naming convention.
    ///
    /// `backup.af` pairs with `backup_passages.json`; a doubled `.af.af`
    /// extension is stripped once more.
    pub fn passages_for(agent_file: &Path) -> PathBuf {
        let stem = agent_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = stem.strip_suffix(AGENT_FILE_EXT).unwrap_or(&stem);
        let dir = agent_file.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{stem}{PASSAGES_SUFFIX}"))
    }
}

/// `{"agent_id": ..., "passages": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassagesDocument {
    pub agent_id: String,
    #[serde(default)]
    pub passages: Vec<Passage>,
}

/// Counts read from an agent-state document, when it is JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentFileSummary {
    pub message_count: Option<usize>,
    pub block_count: Option<usize>,
    pub tool_count: Option<usize>,
    /// Id of the agent the document was exported from.
    pub source_agent_id: Option<String>,
}

impl AgentFileSummary {
    /// Parse `raw`; `None` when it is not a JSON object. Counts of absent
    /// lists are zero.
    ///
    /// Understands both the single-agent layout (`messages`, `memory.blocks`)
    /// and the multi-agent layout (`agents[0].messages`, top-level `blocks`).
    pub fn parse(raw: &str) -> Option<Self> {
        let doc: Value = serde_json::from_str(raw).ok()?;
        if !doc.is_object() {
            return None;
        }
        let agent = doc
            .get("agents")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .unwrap_or(&doc);

        let len_of = |v: Option<&Value>| v.and_then(Value::as_array).map(Vec::len);

        // a missing list counts as empty
        let messages = len_of(agent.get("messages")).or(len_of(doc.get("messages")));
        let blocks = len_of(agent.pointer("/memory/blocks"))
            .or(len_of(doc.pointer("/memory/blocks")))
            .or(len_of(doc.get("blocks")));
        let tools = len_of(agent.get("tools")).or(len_of(doc.get("tools")));

        Some(Self {
            message_count: Some(messages.unwrap_or(0)),
            block_count: Some(blocks.unwrap_or(0)),
            tool_count: Some(tools.unwrap_or(0)),
            source_agent_id: agent
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Write `contents` to a temporary sibling of `path`, then rename into place.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
