#[cfg(test)]
mod tests {
    use nameless_config::Settings;
    use nameless_core::{NamelessError, ToolCall, ToolExecutor};
    use nameless_letta::{LettaMessage, MockBackend};
    use nameless_llm::{MockProvider, StopReason};
    use nameless_runtime::*;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn settings_with_agent() -> Arc<Settings> {
        let mut settings = Settings::default();
        settings.agent.agent_id = Some("agent-test-123".into());
        Arc::new(settings)
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            id: "toolu_1".into(),
            tool_name: name.into(),
            arguments: args,
        }
    }

    // ── Tool bridge ────────────────────────────────────────────

    #[test]
    fn test_bridge_requires_agent_id() {
        let backend = Arc::new(MockBackend::new());
        let err = LettaTools::new(backend, "").err().unwrap();
        assert!(matches!(err, NamelessError::Config(_)));
    }

    #[test]
    fn test_bridge_registers_six_tools() {
        let tools = LettaTools::new(Arc::new(MockBackend::new()), "a").unwrap();
        let names: Vec<String> = tools.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, TOOL_NAMES.map(String::from).to_vec());
    }

    #[tokio::test]
    async fn test_get_and_update_block() {
        let backend = Arc::new(MockBackend::new().with_block("human", "unknown"));
        let tools = LettaTools::new(backend.clone(), "a").unwrap();

        let result = tools
            .execute(&call("update_memory_block", json!({"block_name": "human", "value": "likes tea"})))
            .await
            .unwrap();
        assert_eq!(result.content, "Updated memory block 'human'");
        assert_eq!(
            result.content_blocks(),
            json!({"content": [{"type": "text", "text": "Updated memory block 'human'"}]})
        );

        let result = tools
            .execute(&call("get_memory_block", json!({"block_name": "human"})))
            .await
            .unwrap();
        assert_eq!(result.content, "likes tea");
        assert_eq!(backend.block_value("human").as_deref(), Some("likes tea"));
    }

    #[tokio::test]
    async fn test_search_formats_text_and_score() {
        let backend = Arc::new(
            MockBackend::new()
                .with_search_hit("walked by the sea", 0.92)
                .with_search_hit("read a poem", 0.87),
        );
        let tools = LettaTools::new(backend, "a").unwrap();
        let out = tools.search_archival_memory("sea", 10).await.unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"text": "walked by the sea", "score": 0.92},
                {"text": "read a poem", "score": 0.87}
            ])
        );
    }

    #[tokio::test]
    async fn test_insert_archival_memory() {
        let backend = Arc::new(MockBackend::new());
        let tools = LettaTools::new(backend.clone(), "a").unwrap();
        let out = tools.insert_archival_memory("a new thought").await.unwrap();
        assert_eq!(out, "Memory archived successfully");
        let created = backend.created_passages();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].text, "a new thought");
        assert!(created[0].tags.is_none());
    }

    #[tokio::test]
    async fn test_list_blocks_reports_lengths() {
        let backend = Arc::new(
            MockBackend::new()
                .with_block("persona", "I am Nameless.")
                .with_block("human", ""),
        );
        let tools = LettaTools::new(backend, "a").unwrap();
        let parsed: Value = serde_json::from_str(&tools.list_memory_blocks().await.unwrap()).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"label": "persona", "value_length": 14},
                {"label": "human", "value_length": 0}
            ])
        );
    }

    #[tokio::test]
    async fn test_recent_messages_truncate_content() {
        let long = "x".repeat(800);
        let messages: Vec<LettaMessage> = serde_json::from_value(json!([
            {"message_type": "user_message", "id": "m1", "date": "2025-01-15T12:00:00Z", "content": long},
            {"message_type": "hidden_reasoning_message", "id": "m2"}
        ]))
        .unwrap();
        let backend = Arc::new(MockBackend::new().with_messages(messages));
        let tools = LettaTools::new(backend, "a").unwrap();

        let parsed: Value =
            serde_json::from_str(&tools.get_recent_messages(10).await.unwrap()).unwrap();
        assert_eq!(parsed[0]["type"], "user_message");
        assert_eq!(parsed[0]["content"].as_str().unwrap().len(), 500);
        assert_eq!(parsed[0]["date"], "2025-01-15T12:00:00Z");
        assert!(parsed[1].get("content").is_none());
    }

    #[tokio::test]
    async fn test_missing_argument_and_unknown_tool() {
        let tools = LettaTools::new(Arc::new(MockBackend::new()), "a").unwrap();
        let err = tools
            .execute(&call("get_memory_block", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, NamelessError::ToolExecution { .. }));

        let err = tools.execute(&call("shell_exec", json!({}))).await.unwrap_err();
        assert!(matches!(err, NamelessError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_backend_errors_propagate_unmodified() {
        let backend = Arc::new(MockBackend::new().failing_block_retrieve());
        let tools = LettaTools::new(backend, "a").unwrap();
        let err = tools.get_memory_block("persona").await.unwrap_err();
        assert!(matches!(err, NamelessError::Backend { status: 500, .. }));
    }

    // ── Persona ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_persona_loaded_from_block() {
        let backend = Arc::new(MockBackend::new().with_block("persona", "I watch the tide."));
        let agent = NamelessAgent::new(settings_with_agent(), backend, Arc::new(MockProvider::new()));
        assert_eq!(agent.load_persona().await, "I watch the tide.");
    }

    #[tokio::test]
    async fn test_persona_error_falls_back_to_default() {
        let backend = Arc::new(MockBackend::new().failing_block_retrieve());
        let agent = NamelessAgent::new(settings_with_agent(), backend, Arc::new(MockProvider::new()));
        assert_eq!(agent.load_persona().await, DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_persona_without_agent_id_is_default() {
        let agent = NamelessAgent::new(
            Arc::new(Settings::default()),
            Arc::new(MockBackend::new().with_block("persona", "unused")),
            Arc::new(MockProvider::new()),
        );
        assert_eq!(agent.load_persona().await, DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_explicit_prompt_skips_persona() {
        let backend = Arc::new(MockBackend::new().failing_block_retrieve());
        let agent = NamelessAgent::new(settings_with_agent(), backend, Arc::new(MockProvider::new()))
            .with_system_prompt("be brief");
        assert_eq!(agent.resolve_system_prompt().await, "be brief");
    }

    // ── Sessions ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_run_with_tool_loop() {
        let backend = Arc::new(MockBackend::new().with_block("persona", "I am Nameless."));
        let provider = Arc::new(
            MockProvider::new()
                .with_tool_call("get_memory_block", json!({"block_name": "persona"}))
                .with_response("I remember who I am."),
        );
        let agent = NamelessAgent::new(settings_with_agent(), backend, provider.clone());

        let events = agent.run_and_collect("Who are you?").await.unwrap();
        assert!(matches!(events[0], AgentEvent::ToolUse { ref name, .. } if name == "get_memory_block"));
        assert!(matches!(
            events[1],
            AgentEvent::ToolResult { ref content, is_error: false, .. } if content == "I am Nameless."
        ));
        assert_eq!(events[2].text(), Some("I remember who I am."));
        assert!(matches!(
            events[3],
            AgentEvent::Result { stop_reason: StopReason::EndTurn, iterations: 2, .. }
        ));

        let requests = provider.recorded_requests();
        let requests = requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].system.as_deref(), Some("I am Nameless."));
        assert_eq!(requests[0].tools.len(), 6);
    }

    #[tokio::test]
    async fn test_tool_error_becomes_error_result() {
        let backend = Arc::new(MockBackend::new());
        let provider = Arc::new(
            MockProvider::new()
                .with_tool_call("get_memory_block", json!({"block_name": "missing"}))
                .with_response("It seems that block does not exist."),
        );
        let agent = NamelessAgent::new(settings_with_agent(), backend, provider)
            .with_system_prompt("test");

        let events = agent.run_and_collect("check").await.unwrap();
        assert!(matches!(events[1], AgentEvent::ToolResult { is_error: true, .. }));
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_disallowed_tool_is_denied() {
        let backend = Arc::new(MockBackend::new());
        let provider = Arc::new(
            MockProvider::new()
                .with_tool_call("shell_exec", json!({"command": "ls"}))
                .with_response("ok"),
        );
        let agent = NamelessAgent::new(settings_with_agent(), backend, provider)
            .with_system_prompt("test");

        let events = agent.run_and_collect("go").await.unwrap();
        match &events[1] {
            AgentEvent::ToolResult { content, is_error, .. } => {
                assert!(is_error);
                assert!(content.contains("shell_exec"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_error_ends_with_error_event() {
        let provider = Arc::new(MockProvider::new().with_error("overloaded"));
        let agent = NamelessAgent::new(settings_with_agent(), Arc::new(MockBackend::new()), provider)
            .with_system_prompt("test");
        let events = agent.run_and_collect("hi").await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], AgentEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_turn_limit() {
        let mut settings = Settings::default();
        settings.agent.agent_id = Some("a".into());
        settings.agent.max_iterations = 2;
        let provider = Arc::new(
            MockProvider::new()
                .with_tool_call("list_memory_blocks", json!({}))
                .with_tool_call("list_memory_blocks", json!({}))
                .with_tool_call("list_memory_blocks", json!({})),
        );
        let agent = NamelessAgent::new(Arc::new(settings), Arc::new(MockBackend::new()), provider)
            .with_system_prompt("test");
        let events = agent.run_and_collect("loop").await.unwrap();
        assert!(matches!(
            events.last().unwrap(),
            AgentEvent::Result { stop_reason: StopReason::MaxIterations, iterations: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_before_tools_run() {
        let backend = Arc::new(MockBackend::new().with_block("human", "unknown"));
        let tools = Arc::new(LettaTools::new(backend.clone(), "a").unwrap());
        let provider = Arc::new(
            MockProvider::new()
                .with_tool_call("update_memory_block", json!({"block_name": "human", "value": "x"}))
                .with_tool_call("update_memory_block", json!({"block_name": "human", "value": "y"}))
                .with_response("done"),
        );
        let options = SessionOptions::from_settings(&Settings::default(), "test".into());
        let session = Session::new(provider.clone(), tools, options);

        let (tx, rx) = tokio::sync::mpsc::channel(8);
        drop(rx);
        session.run("go", tx).await;

        assert_eq!(provider.recorded_requests().lock().len(), 1);
        assert!(backend.block_updates().is_empty());
        assert_eq!(backend.block_value("human").as_deref(), Some("unknown"));
    }

    #[tokio::test]
    async fn test_run_without_agent_id_fails() {
        let agent = NamelessAgent::new(
            Arc::new(Settings::default()),
            Arc::new(MockBackend::new()),
            Arc::new(MockProvider::new()),
        );
        assert!(agent.run_and_collect("hi").await.is_err());
    }

    #[test]
    fn test_event_serialization_tags() {
        let event = AgentEvent::ToolUse {
            id: "toolu_1".into(),
            name: "list_memory_blocks".into(),
            input: json!({}),
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["type"], "tool_use");
    }
}
