//! # nameless-config
//!
//! Configuration for the Nameless agent. Reads `nameless.toml` and
//! environment variables; environment always wins.
//!
//! Components receive an immutable `Arc<Settings>` at construction.
//! `SettingsCache` keeps one loaded value until cleared.

pub mod loader;
pub mod schema;

pub use loader::{SettingsCache, SettingsLoader, clear_settings_cache, get_settings, std_env};
pub use schema::{ConfigWarning, Settings, WarningSeverity};
