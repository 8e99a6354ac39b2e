#[cfg(test)]
mod tests {
    use nameless_core::{Message, NamelessError, Role};
    use nameless_llm::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(text: &str) -> LlmRequest {
        LlmRequest {
            model: "claude-sonnet-4-20250514".into(),
            messages: vec![Message::text(uuid::Uuid::nil(), Role::User, text)],
            tools: vec![],
            system: Some("be nice".into()),
            max_tokens: 100,
            temperature: 0.7,
        }
    }

    // ── MockProvider ───────────────────────────────────────────

    #[tokio::test]
    async fn test_mock_responses_in_order() {
        let provider = MockProvider::new()
            .with_tool_call("list_memory_blocks", json!({}))
            .with_response("done");

        let first = provider.complete(&request("hi")).await.unwrap();
        assert!(first.has_tool_calls);
        assert_eq!(first.stop_reason, StopReason::ToolUse);
        assert_eq!(first.message.tool_calls[0].tool_name, "list_memory_blocks");

        let second = provider.complete(&request("hi")).await.unwrap();
        assert_eq!(second.message.text_content(), "done");
        assert_eq!(second.stop_reason, StopReason::EndTurn);
    }

    #[tokio::test]
    async fn test_mock_error_and_recording() {
        let provider = MockProvider::new().with_error("overloaded");
        let err = provider.complete(&request("hi")).await.unwrap_err();
        assert!(matches!(err, NamelessError::LlmProvider(_)));

        let recorded = provider.recorded_requests();
        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].system.as_deref(), Some("be nice"));
    }

    // ── AnthropicProvider over HTTP ────────────────────────────

    #[tokio::test]
    async fn test_anthropic_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Hello from the perch."}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("sk-test".into()).with_base_url(server.uri());
        let resp = provider.complete(&request("hi")).await.unwrap();
        assert_eq!(resp.message.text_content(), "Hello from the perch.");
        assert_eq!(resp.usage.input_tokens, 10);
    }

    #[tokio::test]
    async fn test_anthropic_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("sk-test".into()).with_base_url(server.uri());
        let err = provider.complete(&request("hi")).await.unwrap_err();
        assert!(matches!(
            err,
            NamelessError::RateLimited {
                retry_after_secs: 12
            }
        ));
    }

    #[tokio::test]
    async fn test_anthropic_from_settings_requires_key() {
        let settings = nameless_config::Settings::default();
        assert!(AnthropicProvider::from_settings(&settings).is_err());
    }
}
