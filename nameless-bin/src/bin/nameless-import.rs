use clap::Parser;
use nameless_cli::ImportCommand;

#[tokio::main]
async fn main() {
    if let Err(e) = ImportCommand::parse().run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
