//! # nameless-core
//!
//! Core types and traits shared by every crate in the Nameless workspace:
//! the unified error type, tool descriptors and the `ToolExecutor` seam,
//! and the conversation messages exchanged with the reasoning runtime.

pub mod error;
pub mod message;
pub mod tool;
pub mod types;

pub use error::{NamelessError, Result};
pub use message::{Message, MessageContent, Role};
pub use tool::{Tool, ToolCall, ToolExecutor, ToolResult};
pub use types::*;
