//! Mock LLM provider for deterministic testing.
//!
//! Returns pre-configured responses without making any HTTP calls.

use async_trait::async_trait;
use nameless_core::{Message, MessageContent, NamelessError, Result, Role, ToolCall};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::provider::*;

/// A mock LLM provider that returns pre-configured responses in order.
///
/// # Example
/// ```
/// use nameless_llm::MockProvider;
/// let provider = MockProvider::new()
///     .with_tool_call("list_memory_blocks", serde_json::json!({}))
///     .with_response("I remember.");
/// ```
pub struct MockProvider {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

/// A pre-configured response from the mock provider.
#[derive(Clone)]
pub struct MockResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    pub usage: Usage,
    /// If set, the provider returns this error instead.
    pub error: Option<String>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            text: String::new(),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 100,
                output_tokens: 50,
                ..Default::default()
            },
            error: None,
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Queue a plain text response.
    pub fn with_response(self, text: &str) -> Self {
        self.with_mock_response(MockResponse {
            text: text.to_string(),
            ..Default::default()
        })
    }

    /// Queue a single tool call.
    pub fn with_tool_call(self, name: &str, args: serde_json::Value) -> Self {
        let id = format!("toolu_{}", uuid::Uuid::new_v4().simple());
        self.with_mock_response(MockResponse {
            tool_calls: vec![ToolCall {
                id,
                tool_name: name.to_string(),
                arguments: args,
            }],
            stop_reason: StopReason::ToolUse,
            ..Default::default()
        })
    }

    /// Queue an error.
    pub fn with_error(self, error: &str) -> Self {
        self.with_mock_response(MockResponse {
            error: Some(error.to_string()),
            ..Default::default()
        })
    }

    pub fn with_mock_response(self, resp: MockResponse) -> Self {
        self.responses.lock().push_back(resp);
        self
    }

    /// Shared handle to every request received.
    pub fn recorded_requests(&self) -> Arc<Mutex<Vec<LlmRequest>>> {
        Arc::clone(&self.requests)
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| MockResponse {
                text: "(mock: no more queued responses)".to_string(),
                ..Default::default()
            })
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().push(request.clone());
        let mock = self.next_response();

        if let Some(error) = mock.error {
            return Err(NamelessError::LlmProvider(error));
        }

        let mut msg = Message::text(uuid::Uuid::nil(), Role::Assistant, "");
        msg.content = if mock.text.is_empty() {
            vec![]
        } else {
            vec![MessageContent::Text { text: mock.text }]
        };
        let has_tool_calls = !mock.tool_calls.is_empty();
        msg.tool_calls = mock.tool_calls;

        Ok(LlmResponse {
            message: msg,
            usage: mock.usage,
            has_tool_calls,
            stop_reason: mock.stop_reason,
        })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
