use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use crate::schema::Settings;

/// Loads settings from `nameless.toml` and the environment.
///
/// Precedence, lowest to highest: built-in defaults, the TOML file,
/// environment variables. Every field that has an environment variable is
/// overridden by it when the variable is set.
pub struct SettingsLoader {
    settings: Arc<Settings>,
    config_path: PathBuf,
}

impl SettingsLoader {
    /// Resolve the config path: explicit path > NAMELESS_CONFIG env > ~/.nameless/nameless.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Some(p) = std_env("NAMELESS_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nameless")
            .join("nameless.toml")
    }

    /// Load from disk and the process environment.
    pub fn load(path: Option<&Path>) -> nameless_core::Result<Self> {
        Self::load_with_env(path, std_env)
    }

    /// Load using `env` as the environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> nameless_core::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = Self::resolve_path(path);
        let settings = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&raw).map_err(|e| {
                nameless_core::NamelessError::Config(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            debug!(?config_path, "config file not found, using defaults");
            Settings::default()
        };

        let settings = Self::apply_env_overrides(settings, env);

        match settings.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    debug!("{}", w);
                }
            }
            Err(e) => return Err(nameless_core::NamelessError::Config(e)),
        }

        Ok(Self {
            settings: Arc::new(settings),
            config_path,
        })
    }

    /// Shared, immutable settings handle.
    pub fn get(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply environment overrides on top of `settings`.
    pub fn apply_env_overrides<F>(mut settings: Settings, env: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        // Letta
        if let Some(v) = env("LETTA_BASE_URL") {
            settings.letta.base_url = v;
        }
        if let Some(v) = env("LETTA_API_KEY") {
            settings.letta.api_key = Some(v);
        }
        if let Some(v) = env("LETTA_PASSWORD") {
            settings.letta.password = Some(v);
        }

        // Agent
        if let Some(v) = env("NAMELESS_AGENT_ID") {
            settings.agent.agent_id = Some(v);
        }
        if let Some(v) = env("NAMELESS_MODEL") {
            settings.agent.model = v;
        }
        if let Some(v) = env("NAMELESS_SYSTEM_PROMPT") {
            settings.agent.system_prompt = Some(v);
        }
        if let Some(v) = parse_env(&env, "NAMELESS_MAX_TOKENS") {
            settings.agent.max_tokens = v;
        }
        if let Some(v) = parse_env(&env, "NAMELESS_TEMPERATURE") {
            settings.agent.temperature = v;
        }
        if let Some(v) = parse_env(&env, "NAMELESS_MAX_ITERATIONS") {
            settings.agent.max_iterations = v;
        }

        // Bluesky
        if let Some(v) = env("BLUESKY_HANDLE") {
            settings.bluesky.handle = Some(v);
        }
        if let Some(v) = env("BLUESKY_APP_PASSWORD") {
            settings.bluesky.app_password = Some(v);
        }
        if let Some(v) = env("BLUESKY_SERVICE_URL") {
            settings.bluesky.service_url = v;
        }

        // Discord
        if let Some(v) = env("DISCORD_BOT_TOKEN") {
            settings.discord.bot_token = Some(v);
        }
        if let Some(v) = env("DISCORD_GUILD_ID") {
            settings.discord.guild_id = Some(v);
        }

        // Triggers
        if let Some(v) = parse_env(&env, "PERCH_INTERVAL_HOURS") {
            settings.triggers.perch_interval_hours = v;
        }

        // Services
        if let Some(v) = env("ANTHROPIC_API_KEY") {
            settings.services.anthropic_api_key = Some(v);
        }
        if let Some(v) = env("ANTHROPIC_BASE_URL") {
            settings.services.anthropic_base_url = Some(v);
        }

        // Export
        if let Some(v) = env("NAMELESS_EXPORT_DIR") {
            settings.export.output_dir = PathBuf::from(v);
        }
        if let Some(v) = env("NAMELESS_EXPORT_PREFIX") {
            settings.export.file_prefix = v;
        }

        // Logging
        if let Some(v) = env("NAMELESS_LOG_LEVEL") {
            settings.logging.level = v;
        }
        if let Some(v) = env("NAMELESS_LOG_FORMAT") {
            settings.logging.format = v;
        }

        settings
    }
}

/// Look up `key` and parse it; an unparseable value is ignored with a warning.
fn parse_env<T, F>(env: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

/// Process environment lookup; empty values count as unset.
pub fn std_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

type LoadFn = dyn Fn() -> nameless_core::Result<Arc<Settings>> + Send + Sync;

/// Caches one loaded `Settings` value until explicitly cleared.
pub struct SettingsCache {
    cached: RwLock<Option<Arc<Settings>>>,
    load: Box<LoadFn>,
}

impl SettingsCache {
    pub fn new<F>(load: F) -> Self
    where
        F: Fn() -> nameless_core::Result<Arc<Settings>> + Send + Sync + 'static,
    {
        Self {
            cached: RwLock::new(None),
            load: Box::new(load),
        }
    }

    /// Return the cached settings, loading them on first use.
    pub fn get(&self) -> nameless_core::Result<Arc<Settings>> {
        if let Some(settings) = self.cached.read().as_ref() {
            return Ok(Arc::clone(settings));
        }
        let mut slot = self.cached.write();
        if let Some(settings) = slot.as_ref() {
            return Ok(Arc::clone(settings));
        }
        let settings = (self.load)()?;
        *slot = Some(Arc::clone(&settings));
        Ok(settings)
    }

    /// Drop the cached value; the next `get` reloads.
    pub fn clear(&self) {
        *self.cached.write() = None;
    }
}

static SETTINGS: LazyLock<SettingsCache> =
    LazyLock::new(|| SettingsCache::new(|| SettingsLoader::load(None).map(|l| l.get())));

/// Process-wide settings, loaded once from the default path and the environment.
pub fn get_settings() -> nameless_core::Result<Arc<Settings>> {
    SETTINGS.get()
}

/// Invalidate the process-wide settings cache.
pub fn clear_settings_cache() {
    SETTINGS.clear();
}
