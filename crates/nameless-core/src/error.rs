use thiserror::Error;

/// Unified error type for the Nameless agent.
#[derive(Error, Debug)]
pub enum NamelessError {
    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Memory backend errors ──────────────────────────────────
    #[error("memory backend returned HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("memory backend unreachable: {0}")]
    Transport(String),

    // ── LLM errors ─────────────────────────────────────────────
    #[error("llm provider error: {0}")]
    LlmProvider(String),

    #[error("llm rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Tool errors ────────────────────────────────────────────
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed: {tool}: {reason}")]
    ToolExecution { tool: String, reason: String },

    #[error("tool not in allow-list: {tool}")]
    ToolDenied { tool: String },

    // ── Channel errors ─────────────────────────────────────────
    #[error("channel error: {channel}: {reason}")]
    Channel { channel: String, reason: String },

    // ── Export / import errors ─────────────────────────────────
    #[error("import failed: {0}")]
    Import(String),

    #[error("not found: {0}")]
    NotFound(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NamelessError>;
