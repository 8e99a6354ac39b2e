use clap::Parser;
use nameless_cli::ExportCommand;

#[tokio::main]
async fn main() {
    if let Err(e) = ExportCommand::parse().run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
