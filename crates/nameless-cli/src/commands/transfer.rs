use clap::{Args, Parser};
use std::path::PathBuf;
use tracing::{debug, error, info};

use nameless_config::Settings;
use nameless_letta::{ImportOverrides, LettaClient};
use nameless_transfer::{ExportRequest, ImportRequest, export_agent, import_agent, verify_agent};

use super::{init_tracing, load_settings};

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Letta agent ID to export
    pub agent_id: String,

    /// Source Letta server URL (default: LETTA_BASE_URL)
    #[arg(long)]
    pub source_url: Option<String>,

    /// API key for the source server (default: LETTA_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Output directory for export files (default: ./exports)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Path to .af agent file
    pub agent_file: PathBuf,

    /// Path to passages JSON file (default: inferred from the agent file name)
    #[arg(long)]
    pub passages: Option<PathBuf>,

    /// Target Letta server URL (default: LETTA_BASE_URL)
    #[arg(long)]
    pub target_url: Option<String>,

    /// API key for the target server (default: LETTA_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Override agent name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Override LLM model
    #[arg(long)]
    pub model: Option<String>,

    /// Override embedding model
    #[arg(long)]
    pub embedding: Option<String>,

    /// Verify the agent after import
    #[arg(long)]
    pub verify: bool,
}

fn client_for(
    settings: &Settings,
    url: Option<&str>,
    api_key: Option<String>,
) -> nameless_core::Result<LettaClient> {
    let base_url = url.unwrap_or(&settings.letta.base_url);
    let credential = api_key.or_else(|| settings.letta.credential().map(String::from));
    LettaClient::new(base_url, credential)
}

pub(crate) async fn cmd_export(
    settings: &Settings,
    args: ExportArgs,
    verbose: bool,
) -> nameless_core::Result<()> {
    let client = client_for(settings, args.source_url.as_deref(), args.api_key)?;
    info!(agent_id = %args.agent_id, source = client.base_url(), "exporting agent");

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| settings.export.output_dir.clone());
    let mut request = ExportRequest::new(args.agent_id, output_dir);
    request.prefix = settings.export.file_prefix.clone();

    let result = export_agent(&client, &request).await.inspect_err(|e| {
        if verbose {
            debug!(error = ?e, "export failed");
        }
        error!("Export failed: {e}");
    })?;

    println!("\nExport complete!");
    println!("  Agent file: {}", result.agent_file_path.display());
    println!("  Passages:   {}", result.passages_file_path.display());
    println!("  Total passages exported: {}", result.passage_count);
    if let Some(messages) = result.message_count {
        println!("  Total messages: {messages}");
    }
    Ok(())
}

pub(crate) async fn cmd_import(
    settings: &Settings,
    args: ImportArgs,
    verbose: bool,
) -> nameless_core::Result<()> {
    if !args.agent_file.exists() {
        error!("Agent file not found: {}", args.agent_file.display());
        return Err(nameless_core::NamelessError::NotFound(format!(
            "agent file {}",
            args.agent_file.display()
        )));
    }

    let client = client_for(settings, args.target_url.as_deref(), args.api_key)?;
    info!(
        path = %args.agent_file.display(),
        target = client.base_url(),
        "importing agent"
    );

    let verify = args.verify;
    let request = ImportRequest {
        agent_file: args.agent_file,
        passages_file: args.passages,
        overrides: ImportOverrides {
            name: args.name,
            model: args.model,
            embedding: args.embedding,
        },
    };

    let outcome = async {
        let result = import_agent(&client, &request).await?;
        if verify {
            verify_agent(&client, &result.agent_id).await?;
        }
        Ok::<_, nameless_core::NamelessError>(result)
    }
    .await;

    let result = outcome.inspect_err(|e| {
        if verbose {
            debug!(error = ?e, "import failed");
        }
        error!("Import failed: {e}");
    })?;

    println!("\nImport complete!");
    println!("  Agent ID: {}", result.agent_id);
    if let Some(ref name) = result.name {
        println!("  Name: {name}");
    }
    println!("  Passages imported: {}", result.passages_imported);
    println!("\nAdd to .env: NAMELESS_AGENT_ID={}", result.agent_id);
    Ok(())
}

/// `nameless-export`: standalone export entry point.
#[derive(Parser, Debug)]
#[command(name = "nameless-export", version)]
#[command(about = "Export a Nameless agent and its archival memory from a Letta server")]
pub struct ExportCommand {
    #[command(flatten)]
    pub args: ExportArgs,

    /// Path to nameless.toml config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

impl ExportCommand {
    pub async fn run(self) -> nameless_core::Result<()> {
        let settings = load_settings(self.config.as_deref())?;
        init_tracing(&settings, self.verbose);
        cmd_export(&settings, self.args, self.verbose).await
    }
}

/// `nameless-import`: standalone import entry point.
#[derive(Parser, Debug)]
#[command(name = "nameless-import", version)]
#[command(about = "Import a Nameless agent and its archival memory into a Letta server")]
pub struct ImportCommand {
    #[command(flatten)]
    pub args: ImportArgs,

    /// Path to nameless.toml config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

impl ImportCommand {
    pub async fn run(self) -> nameless_core::Result<()> {
        let settings = load_settings(self.config.as_deref())?;
        init_tracing(&settings, self.verbose);
        cmd_import(&settings, self.args, self.verbose).await
    }
}
