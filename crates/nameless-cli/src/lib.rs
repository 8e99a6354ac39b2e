//! # nameless-cli
//!
//! Command-line interface for the Nameless agent.
//!
//! ## Commands
//!
//! - `nameless chat` - Send one message to the agent
//! - `nameless export` / `nameless import` - Move an agent between Letta servers
//! - `nameless perch` - Run the periodic reflection loop
//! - `nameless bluesky` / `nameless discord` - Social triggers
//! - `nameless config` / `nameless doctor` - Inspect and audit configuration

pub mod commands;

pub use commands::transfer::{ExportArgs, ExportCommand, ImportArgs, ImportCommand};
pub use commands::{Cli, init_tracing, load_settings};
