use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nameless_config::{Settings, SettingsLoader, WarningSeverity};
use nameless_core::NamelessError;

mod chat;
pub mod transfer;
mod triggers;

use transfer::{ExportArgs, ImportArgs};
use triggers::BlueskyAction;

/// Nameless: a stateful agent with persistent Letta memory
#[derive(Parser)]
#[command(name = "nameless", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to nameless.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message to the agent and print its replies
    Chat {
        /// Message text
        message: String,
        /// Letta agent ID (defaults to NAMELESS_AGENT_ID)
        #[arg(short, long)]
        agent_id: Option<String>,
        /// System prompt override (defaults to the agent's persona block)
        #[arg(short, long)]
        system_prompt: Option<String>,
    },
    /// Export an agent and its archival memory from a Letta server
    Export(ExportArgs),
    /// Import an agent and its archival memory into a Letta server
    Import(ImportArgs),
    /// Run perch time: periodic autonomous reflection
    Perch {
        /// Hours between cycles (defaults to PERCH_INTERVAL_HOURS)
        #[arg(long)]
        interval_hours: Option<u64>,
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Bluesky trigger
    Bluesky {
        #[command(subcommand)]
        action: BlueskyAction,
    },
    /// Discord trigger
    Discord,
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Audit configuration
    Doctor,
    /// Show version and build info
    Version,
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Load `.env`, then settings from `config` or the process-wide cache.
pub fn load_settings(config: Option<&Path>) -> nameless_core::Result<Arc<Settings>> {
    // existing variables win over .env
    dotenv::dotenv().ok();
    match config {
        Some(path) => Ok(SettingsLoader::load(Some(path))?.get()),
        None => nameless_config::get_settings(),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--verbose` and
/// `logging.level`.
pub fn init_tracing(settings: &Settings, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let result = if settings.logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };
    // already installed
    let _ = result;
}

impl Cli {
    pub async fn run(self) -> nameless_core::Result<()> {
        if let Commands::Completions { shell } = self.command {
            return Self::cmd_completions(shell);
        }

        let settings = load_settings(self.config.as_deref())?;
        init_tracing(&settings, self.verbose);
        let verbose = self.verbose;

        match self.command {
            Commands::Chat {
                message,
                agent_id,
                system_prompt,
            } => chat::cmd_chat(settings, &message, agent_id, system_prompt).await,
            Commands::Export(args) => transfer::cmd_export(&settings, args, verbose).await,
            Commands::Import(args) => transfer::cmd_import(&settings, args, verbose).await,
            Commands::Perch {
                interval_hours,
                once,
            } => triggers::cmd_perch(settings, interval_hours, once).await,
            Commands::Bluesky { action } => triggers::cmd_bluesky(&settings, action).await,
            Commands::Discord => triggers::cmd_discord(settings),
            Commands::Config { json } => Self::cmd_config(&settings, json),
            Commands::Doctor => Self::cmd_doctor(&settings),
            Commands::Version => Self::cmd_version(),
            Commands::Completions { .. } => Ok(()),
        }
    }

    fn cmd_config(settings: &Settings, json: bool) -> nameless_core::Result<()> {
        let rendered = if json {
            serde_json::to_string_pretty(settings)?
        } else {
            toml::to_string_pretty(settings).map_err(|e| NamelessError::Config(e.to_string()))?
        };
        println!("{rendered}");
        Ok(())
    }

    fn cmd_doctor(settings: &Settings) -> nameless_core::Result<()> {
        println!("Nameless Doctor: configuration audit");
        println!();

        let warnings = match settings.validate() {
            Ok(w) => w,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };

        let mut warn_count = 0;
        let mut info_count = 0;
        for w in &warnings {
            println!("  {w}");
            match w.severity {
                WarningSeverity::Warning => warn_count += 1,
                WarningSeverity::Info => info_count += 1,
                WarningSeverity::Error => {}
            }
        }

        if settings.letta.credential().is_none() {
            println!("  [info] letta: no API key or password, requests are unauthenticated");
            info_count += 1;
        }
        if settings.services.anthropic_api_key.is_none() {
            println!("  [warning] services.anthropic_api_key: not set, chat and perch will fail");
            println!("   -> Set ANTHROPIC_API_KEY");
            warn_count += 1;
        }

        println!();
        println!("  {warn_count} warnings, {info_count} suggestions");
        Ok(())
    }

    fn cmd_version() -> nameless_core::Result<()> {
        println!("Nameless v{}", env!("CARGO_PKG_VERSION"));
        println!("   Target: {}", std::env::consts::ARCH);
        println!("   OS: {}", std::env::consts::OS);
        #[cfg(debug_assertions)]
        println!("   Profile: debug");
        #[cfg(not(debug_assertions))]
        println!("   Profile: release");
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> nameless_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "nameless", &mut std::io::stdout());
        Ok(())
    }
}
