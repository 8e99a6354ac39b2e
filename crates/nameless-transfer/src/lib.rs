//! # nameless-transfer
//!
//! Moves an agent between memory backends.
//!
//! An export bundle is two sibling files sharing a timestamped stem: the
//! agent-state document (`.af`, written verbatim) and the archival passages
//! (`_passages.json`), which the agent file does not carry.

pub mod bundle;
pub mod export;
pub mod import;

pub use bundle::{AgentFileSummary, BundlePaths, PassagesDocument};
pub use export::{DEFAULT_PAGE_SIZE, ExportRequest, ExportResult, export_agent, export_passages};
pub use import::{
    ImportRequest, ImportResult, VerifyReport, import_agent, import_passages, verify_agent,
};
