#[cfg(test)]
mod tests {
    use nameless_config::Settings;
    use nameless_core::NamelessError;
    use nameless_letta::MockBackend;
    use nameless_llm::MockProvider;
    use nameless_runtime::NamelessAgent;
    use nameless_triggers::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn agent_with(provider: MockProvider) -> Arc<NamelessAgent> {
        let mut settings = Settings::default();
        settings.agent.agent_id = Some("agent-perch".into());
        Arc::new(NamelessAgent::new(
            Arc::new(settings),
            Arc::new(MockBackend::new().with_block("persona", "I am Nameless.")),
            Arc::new(provider),
        ))
    }

    // ── Perch time ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_perch_cycle_sends_fixed_prompt() {
        let provider = MockProvider::new().with_response("The tide came in.");
        let requests = provider.recorded_requests();
        let trigger = PerchTrigger::new(agent_with(provider));

        assert_eq!(trigger.perch_time().await, 1);

        let requests = requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some("I am Nameless."));
        assert_eq!(requests[0].messages[0].text_content(), PERCH_TIME_PROMPT);
    }

    #[tokio::test]
    async fn test_perch_cycle_failure_is_swallowed() {
        let provider = MockProvider::new().with_error("overloaded");
        let trigger = PerchTrigger::new(agent_with(provider));
        assert_eq!(trigger.perch_time().await, 0);
    }

    #[tokio::test]
    async fn test_perch_without_agent_id_is_swallowed() {
        let agent = NamelessAgent::new(
            Arc::new(Settings::default()),
            Arc::new(MockBackend::new()),
            Arc::new(MockProvider::new()),
        );
        let trigger = PerchTrigger::new(Arc::new(agent));
        assert_eq!(trigger.perch_time().await, 0);
    }

    #[test]
    fn test_perch_interval_from_settings() {
        let trigger = PerchTrigger::new(agent_with(MockProvider::new()));
        assert_eq!(trigger.interval(), Duration::from_secs(2 * 3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_perch_loop_runs_immediately_then_every_interval() {
        let provider = MockProvider::new();
        let requests = provider.recorded_requests();
        let handle = PerchTrigger::new(agent_with(provider))
            .with_interval(Duration::from_secs(3600))
            .with_poll_interval(Duration::from_secs(60))
            .start();

        // cycles at 0h, 1h, 2h, 3h
        tokio::time::sleep(Duration::from_secs(3 * 3600 + 1800)).await;
        handle.stop().await;

        assert_eq!(requests.lock().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_perch_stop_before_next_cycle() {
        let provider = MockProvider::new();
        let requests = provider.recorded_requests();
        let handle = PerchTrigger::new(agent_with(provider))
            .with_interval(Duration::from_secs(3600))
            .start();

        tokio::time::sleep(Duration::from_secs(120)).await;
        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;

        assert_eq!(requests.lock().len(), 1);
    }

    // ── Bluesky ────────────────────────────────────────────────

    async fn mount_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_partial_json(json!({"identifier": "nameless.bsky.social"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessJwt": "jwt-1",
                "refreshJwt": "jwt-r",
                "did": "did:plc:nameless",
                "handle": "nameless.bsky.social"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> BlueskyClient {
        BlueskyClient::new(
            server.uri(),
            Some("nameless.bsky.social".into()),
            Some("app-pass".into()),
        )
    }

    #[tokio::test]
    async fn test_bluesky_missing_credentials() {
        let client = BlueskyClient::new("http://127.0.0.1:1", None, None);
        let err = client.login().await.unwrap_err();
        assert!(matches!(err, NamelessError::Config(_)));
        assert!(err.to_string().contains("BLUESKY_HANDLE"));
    }

    #[tokio::test]
    async fn test_bluesky_post_truncates_and_reuses_session() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .and(header("authorization", "Bearer jwt-1"))
            .and(body_partial_json(json!({
                "repo": "did:plc:nameless",
                "collection": "app.bsky.feed.post"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uri": "at://did:plc:nameless/app.bsky.feed.post/1",
                "cid": "bafy"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        let uri = client.post("short").await.unwrap();
        assert_eq!(uri, "at://did:plc:nameless/app.bsky.feed.post/1");
        client.post(&"x".repeat(500)).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let last: serde_json::Value = received.last().unwrap().body_json().unwrap();
        let text = last["record"]["text"].as_str().unwrap();
        assert_eq!(text.chars().count(), 300);
        assert!(text.ends_with("..."));
    }

    #[tokio::test]
    async fn test_bluesky_unread_notifications_only() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/xrpc/app.bsky.notification.listNotifications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "notifications": [
                    {"uri": "at://a/1", "reason": "mention", "author": {"handle": "alice.bsky.social"}, "isRead": false, "indexedAt": "2025-01-01T00:00:00Z"},
                    {"uri": "at://b/2", "reason": "like", "author": {"handle": "bob.bsky.social"}, "isRead": true, "indexedAt": "2025-01-01T00:00:00Z"}
                ]
            })))
            .mount(&server)
            .await;

        let unread = client(&server).check_notifications().await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].reason, "mention");
        assert_eq!(unread[0].author, "alice.bsky.social");
    }

    #[tokio::test]
    async fn test_bluesky_poll_marks_seen() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/xrpc/app.bsky.notification.listNotifications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "notifications": [
                    {"uri": "at://a/1", "reason": "mention", "author": {"handle": "alice.bsky.social"}, "isRead": false}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/xrpc/app.bsky.notification.updateSeen"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let trigger = BlueskyTrigger::new(client(&server));
        assert_eq!(trigger.poll_and_respond().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bluesky_thread_lookup() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/xrpc/app.bsky.feed.getPostThread"))
            .and(query_param("uri", "at://a/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "thread": {"post": {"uri": "at://a/1"}}
            })))
            .mount(&server)
            .await;

        let thread = client(&server).get_post_thread("at://a/1").await.unwrap();
        assert_eq!(thread["post"]["uri"], "at://a/1");
    }

    #[tokio::test]
    async fn test_bluesky_api_error_is_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad password"))
            .mount(&server)
            .await;

        let err = client(&server).login().await.unwrap_err();
        assert!(matches!(err, NamelessError::Channel { .. }));
    }

    // ── Discord ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_discord_handlers() {
        let trigger = DiscordTrigger::new(Arc::new(Settings::default()));
        assert!(trigger.on_message("hello there", "alice", "general").await.is_none());
        assert_eq!(
            trigger.on_mention("@nameless hi", "alice", "general").await,
            WAKING_UP_REPLY
        );
    }

    #[test]
    fn test_discord_start_requires_token() {
        let trigger = DiscordTrigger::new(Arc::new(Settings::default()));
        let err = trigger.start().unwrap_err();
        assert!(err.to_string().contains("DISCORD_BOT_TOKEN not configured"));

        let mut settings = Settings::default();
        settings.discord.bot_token = Some("token".into());
        assert!(DiscordTrigger::new(Arc::new(settings)).start().is_ok());
    }
}
