//! # nameless-llm
//!
//! Abstraction over the reasoning runtime. One request/response call per
//! turn with tool use; the tool loop itself lives in `nameless-runtime`.

pub mod anthropic;
pub mod mock;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use mock::{MockProvider, MockResponse};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, StopReason, Usage};
