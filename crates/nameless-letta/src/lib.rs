//! # nameless-letta
//!
//! Client adapter for the Letta memory backend. Every operation is a live
//! round trip; nothing is cached locally.
//!
//! - [`MemoryBackend`] is the seam the rest of the workspace programs against.
//! - [`LettaClient`] speaks the Letta v1 REST API over reqwest.
//! - [`MockBackend`] is an in-memory stand-in for tests.

pub mod backend;
pub mod client;
pub mod mock;
pub mod types;

pub use backend::{AgentUpload, ImportOverrides, ImportResponse, MemoryBackend, PassagePage};
pub use client::LettaClient;
pub use mock::MockBackend;
pub use types::{AgentSummary, Block, LettaMessage, Passage, PassageHit};
