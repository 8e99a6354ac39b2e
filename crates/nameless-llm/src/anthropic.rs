use async_trait::async_trait;
use nameless_config::Settings;
use nameless_core::{Message, MessageContent, NamelessError, Result, Role, ToolCall};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::provider::*;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Build from settings. Fails when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .services
            .anthropic_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| NamelessError::Config("ANTHROPIC_API_KEY is not set".into()))?;
        let provider = Self::new(api_key);
        Ok(match settings.services.anthropic_base_url {
            Some(ref url) => provider.with_base_url(url.clone()),
            None => provider,
        })
    }

    fn build_request_body(&self, request: &LlmRequest) -> Value {
        let mut messages = Vec::new();
        for msg in &request.messages {
            match msg.role {
                Role::System => continue, // sent as the top-level "system" field
                Role::User => {
                    messages.push(json!({
                        "role": "user",
                        "content": msg.text_content(),
                    }));
                }
                Role::Assistant => {
                    if msg.tool_calls.is_empty() {
                        messages.push(json!({
                            "role": "assistant",
                            "content": msg.text_content(),
                        }));
                    } else {
                        let mut blocks: Vec<Value> = Vec::new();
                        let text = msg.text_content();
                        if !text.is_empty() {
                            blocks.push(json!({ "type": "text", "text": text }));
                        }
                        for tc in &msg.tool_calls {
                            blocks.push(json!({
                                "type": "tool_use",
                                "id": tc.id,
                                "name": tc.tool_name,
                                "input": tc.arguments,
                            }));
                        }
                        messages.push(json!({ "role": "assistant", "content": blocks }));
                    }
                }
                Role::Tool => {
                    // Tool results travel as a user turn of tool_result blocks
                    let blocks: Vec<Value> = msg
                        .content
                        .iter()
                        .filter_map(|block| match block {
                            MessageContent::ToolResult {
                                tool_call_id,
                                content,
                                is_error,
                            } => Some(json!({
                                "type": "tool_result",
                                "tool_use_id": tool_call_id,
                                "content": [{ "type": "text", "text": content }],
                                "is_error": is_error,
                            })),
                            _ => None,
                        })
                        .collect();
                    if blocks.is_empty() {
                        messages.push(json!({ "role": "user", "content": msg.text_content() }));
                    } else {
                        messages.push(json!({ "role": "user", "content": blocks }));
                    }
                }
            }
        }

        let mut body = json!({
            "model": &request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": messages,
        });

        if let Some(ref system) = request.system {
            body["system"] = json!(system);
        }

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.parameters,
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }

        body
    }
}

/// Parse a Messages API response body.
fn parse_response(data: &Value) -> LlmResponse {
    let blocks = data["content"].as_array().cloned().unwrap_or_default();

    let text = blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    let tool_calls: Vec<ToolCall> = blocks
        .iter()
        .filter(|b| b["type"] == "tool_use")
        .map(|b| ToolCall {
            id: b["id"].as_str().unwrap_or_default().to_string(),
            tool_name: b["name"].as_str().unwrap_or_default().to_string(),
            arguments: b["input"].clone(),
        })
        .collect();

    let usage = &data["usage"];
    let tokens = |key: &str| usage[key].as_u64().unwrap_or(0) as u32;

    let has_tool_calls = !tool_calls.is_empty();
    let mut message = Message::text(uuid::Uuid::nil(), Role::Assistant, text);
    message.tool_calls = tool_calls;

    LlmResponse {
        message,
        usage: Usage {
            input_tokens: tokens("input_tokens"),
            output_tokens: tokens("output_tokens"),
            cache_read_tokens: tokens("cache_read_input_tokens"),
            cache_write_tokens: tokens("cache_creation_input_tokens"),
        },
        has_tool_calls,
        stop_reason: StopReason::from_api(data["stop_reason"].as_str()),
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let body = self.build_request_body(request);
        debug!(model = %request.model, tools = request.tools.len(), "sending Anthropic API request");

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| NamelessError::LlmProvider(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            if status.as_u16() == 429 {
                let retry_after_secs = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30);
                return Err(NamelessError::RateLimited { retry_after_secs });
            }
            let text = resp.text().await.unwrap_or_default();
            return Err(NamelessError::LlmProvider(format!("HTTP {status}: {text}")));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| NamelessError::LlmProvider(e.to_string()))?;

        Ok(parse_response(&data))
    }

    async fn health_check(&self) -> Result<()> {
        info!("checking Anthropic API configuration");
        if self.api_key.is_empty() {
            return Err(NamelessError::LlmProvider("ANTHROPIC_API_KEY not set".into()));
        }
        Ok(())
    }
}
