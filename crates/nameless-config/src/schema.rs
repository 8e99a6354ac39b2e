use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, maps to `nameless.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub letta: LettaConfig,
    pub agent: AgentConfig,
    pub bluesky: BlueskyConfig,
    pub discord: DiscordConfig,
    pub triggers: TriggerConfig,
    pub services: ServicesConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

// ── Letta ──────────────────────────────────────────────────────

/// Memory backend connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LettaConfig {
    /// Base URL of the Letta server.
    pub base_url: String,
    /// API key for Letta Cloud or a secured server.
    pub api_key: Option<String>,
    /// Server password for self-hosted Letta. Used when no api_key is set.
    pub password: Option<String>,
}

impl Default for LettaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8283".into(),
            api_key: None,
            password: None,
        }
    }
}

impl LettaConfig {
    /// The credential sent to the server, if any.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().or(self.password.as_deref())
    }
}

// ── Agent ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Letta agent ID (set after import).
    pub agent_id: Option<String>,
    /// Anthropic model used for reasoning.
    pub model: String,
    /// Explicit system prompt. When unset the persona block is used.
    pub system_prompt: Option<String>,
    /// Maximum tokens per response.
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0).
    pub temperature: f32,
    /// Maximum reasoning turns per request before the session is closed.
    pub max_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: None,
            model: "claude-sonnet-4-20250514".into(),
            system_prompt: None,
            max_tokens: 8192,
            temperature: 0.7,
            max_iterations: 25,
        }
    }
}

// ── Bluesky ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueskyConfig {
    /// Handle, e.g. "nameless.bsky.social".
    pub handle: Option<String>,
    /// App password (never the account password).
    pub app_password: Option<String>,
    /// PDS / entryway URL.
    pub service_url: String,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            handle: None,
            app_password: None,
            service_url: "https://bsky.social".into(),
        }
    }
}

// ── Discord ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub bot_token: Option<String>,
    /// Primary guild/server ID.
    pub guild_id: Option<String>,
}

// ── Triggers ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Hours between perch time wakeups.
    pub perch_interval_hours: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            perch_interval_hours: 2,
        }
    }
}

// ── Services ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Anthropic API key for Claude models.
    pub anthropic_api_key: Option<String>,
    /// Override for the Anthropic API base URL (proxies, gateways).
    pub anthropic_base_url: Option<String>,
}

// ── Export ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default directory for export bundles.
    pub output_dir: PathBuf,
    /// Filename prefix for export bundles.
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            file_prefix: "nameless".into(),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        write!(f, "[{}] {}: {}", tag, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   -> {}", h)?;
        }
        Ok(())
    }
}

impl Settings {
    /// Validate the settings and return a list of warnings.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Letta ───
        let base_url = &self.letta.base_url;
        if base_url.is_empty() {
            warnings.push(ConfigWarning {
                field: "letta.base_url".into(),
                message: "base URL is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'http://localhost:8283'".into()),
            });
        } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            warnings.push(ConfigWarning {
                field: "letta.base_url".into(),
                message: format!("'{}' is not an http(s) URL", base_url),
                severity: WarningSeverity::Warning,
                hint: Some("Include the scheme, e.g. 'https://api.letta.com'".into()),
            });
        }

        if self.agent.agent_id.is_none() {
            warnings.push(ConfigWarning {
                field: "agent.agent_id".into(),
                message: "no agent ID configured, memory tools are unavailable".into(),
                severity: WarningSeverity::Info,
                hint: Some("Import an agent and set NAMELESS_AGENT_ID".into()),
            });
        }

        // ── Agent model ───
        if self.agent.model.is_empty() {
            warnings.push(ConfigWarning {
                field: "agent.model".into(),
                message: "model is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'claude-sonnet-4-20250514'".into()),
            });
        }

        if self.agent.temperature < 0.0 || self.agent.temperature > 1.0 {
            warnings.push(ConfigWarning {
                field: "agent.temperature".into(),
                message: format!("temperature {} is out of range", self.agent.temperature),
                severity: WarningSeverity::Error,
                hint: Some("Temperature must be between 0.0 and 1.0".into()),
            });
        }

        if self.agent.max_tokens == 0 {
            warnings.push(ConfigWarning {
                field: "agent.max_tokens".into(),
                message: "max_tokens is 0, agent won't produce output".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 8192".into()),
            });
        }

        if self.agent.max_iterations == 0 {
            warnings.push(ConfigWarning {
                field: "agent.max_iterations".into(),
                message: "max_iterations is 0, no reasoning turn can run".into(),
                severity: WarningSeverity::Error,
                hint: None,
            });
        }

        // ── Triggers ───
        if self.triggers.perch_interval_hours == 0 {
            warnings.push(ConfigWarning {
                field: "triggers.perch_interval_hours".into(),
                message: "interval is 0 hours".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set PERCH_INTERVAL_HOURS to 1 or more".into()),
            });
        }

        // ── Bluesky ───
        if self.bluesky.handle.is_some() != self.bluesky.app_password.is_some() {
            warnings.push(ConfigWarning {
                field: "bluesky".into(),
                message: "handle and app_password must be set together".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set both BLUESKY_HANDLE and BLUESKY_APP_PASSWORD".into()),
            });
        }

        // ── Logging ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
