//! # nameless-runtime
//!
//! Connects the reasoning runtime to the memory backend.
//!
//! - [`LettaTools`] exposes six memory operations as callable tools.
//! - [`Session`] runs one request/response cycle with tool use.
//! - [`NamelessAgent`] resolves the system prompt and drives a session per call.

pub mod agent;
pub mod event;
pub mod session;
pub mod tools;

pub use agent::{DEFAULT_SYSTEM_PROMPT, NamelessAgent, run_agent};
pub use event::AgentEvent;
pub use session::{Session, SessionOptions};
pub use tools::{LettaTools, TOOL_NAMES};
