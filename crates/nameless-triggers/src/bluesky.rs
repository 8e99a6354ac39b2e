use chrono::{DateTime, SecondsFormat, Utc};
use nameless_config::Settings;
use nameless_core::{NamelessError, Result, truncate_chars};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Maximum post length in characters.
pub const MAX_POST_CHARS: usize = 300;

/// Truncate to [`MAX_POST_CHARS`], ending in `...` when cut.
pub fn truncate_post(text: &str) -> String {
    let len = text.chars().count();
    if len <= MAX_POST_CHARS {
        return text.to_string();
    }
    warn!(from = len, to = MAX_POST_CHARS, "post truncated");
    format!("{}...", truncate_chars(text, MAX_POST_CHARS - 3))
}

fn channel_err(reason: impl Into<String>) -> NamelessError {
    NamelessError::Channel {
        channel: "bluesky".into(),
        reason: reason.into(),
    }
}

/// An unread notification, reduced to what the trigger uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// "mention", "reply", "like", ...
    pub reason: String,
    /// Author handle.
    pub author: String,
    pub uri: String,
    pub indexed_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotification {
    uri: String,
    reason: String,
    author: RawAuthor,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    indexed_at: String,
}

#[derive(Deserialize)]
struct RawAuthor {
    handle: String,
}

#[derive(Deserialize)]
struct ListNotificationsResponse {
    #[serde(default)]
    notifications: Vec<RawNotification>,
}

#[derive(Deserialize)]
struct CreateRecordResponse {
    uri: String,
}

/// AT Protocol XRPC client for one account. Logs in on first use.
pub struct BlueskyClient {
    client: Client,
    service_url: String,
    handle: Option<String>,
    app_password: Option<String>,
    session: Mutex<Option<Session>>,
}

impl BlueskyClient {
    pub fn new(
        service_url: impl Into<String>,
        handle: Option<String>,
        app_password: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            service_url: service_url.into().trim_end_matches('/').to_string(),
            handle,
            app_password,
            session: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.bluesky.service_url.clone(),
            settings.bluesky.handle.clone(),
            settings.bluesky.app_password.clone(),
        )
    }

    fn xrpc(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service_url, method)
    }

    async fn send(builder: RequestBuilder) -> Result<reqwest::Response> {
        let resp = builder
            .send()
            .await
            .map_err(|e| channel_err(format!("HTTP error: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "Bluesky API error");
            return Err(channel_err(format!("Bluesky API {status}: {text}")));
        }
        Ok(resp)
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(builder: RequestBuilder) -> Result<T> {
        Self::send(builder)
            .await?
            .json()
            .await
            .map_err(|e| channel_err(format!("invalid response: {e}")))
    }

    /// The current session, creating one if needed.
    async fn session(&self) -> Result<Session> {
        let mut guard = self.session.lock().await;
        if let Some(ref session) = *guard {
            return Ok(session.clone());
        }

        let (Some(handle), Some(password)) = (self.handle.as_deref(), self.app_password.as_deref())
        else {
            return Err(NamelessError::Config(
                "BLUESKY_HANDLE and BLUESKY_APP_PASSWORD must be configured".into(),
            ));
        };

        let session: Session = Self::send_json(
            self.client
                .post(self.xrpc("com.atproto.server.createSession"))
                .json(&json!({ "identifier": handle, "password": password })),
        )
        .await?;
        info!(handle = %session.handle, "authenticated to Bluesky");
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Log in now rather than on first use.
    pub async fn login(&self) -> Result<()> {
        self.session().await.map(|_| ())
    }

    /// Publish a post and return its AT URI. Text over the limit is truncated.
    pub async fn post(&self, text: &str) -> Result<String> {
        let text = truncate_post(text);
        let session = self.session().await?;
        let record = json!({
            "repo": session.did,
            "collection": "app.bsky.feed.post",
            "record": {
                "$type": "app.bsky.feed.post",
                "text": text,
                "createdAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }
        });
        let resp: CreateRecordResponse = Self::send_json(
            self.client
                .post(self.xrpc("com.atproto.repo.createRecord"))
                .bearer_auth(&session.access_jwt)
                .json(&record),
        )
        .await?;
        info!("posted to Bluesky: {}...", truncate_chars(&text, 50));
        Ok(resp.uri)
    }

    /// Unread notifications.
    pub async fn check_notifications(&self) -> Result<Vec<Notification>> {
        let session = self.session().await?;
        let resp: ListNotificationsResponse = Self::send_json(
            self.client
                .get(self.xrpc("app.bsky.notification.listNotifications"))
                .bearer_auth(&session.access_jwt),
        )
        .await?;

        let unread: Vec<Notification> = resp
            .notifications
            .into_iter()
            .filter(|n| !n.is_read)
            .map(|n| Notification {
                reason: n.reason,
                author: n.author.handle,
                uri: n.uri,
                indexed_at: n.indexed_at,
            })
            .collect();

        if !unread.is_empty() {
            info!(count = unread.len(), "found unread notifications");
        }
        Ok(unread)
    }

    pub async fn update_seen(&self, seen_at: DateTime<Utc>) -> Result<()> {
        let session = self.session().await?;
        Self::send(
            self.client
                .post(self.xrpc("app.bsky.notification.updateSeen"))
                .bearer_auth(&session.access_jwt)
                .json(&json!({
                    "seenAt": seen_at.to_rfc3339_opts(SecondsFormat::Millis, true)
                })),
        )
        .await?;
        Ok(())
    }

    /// A post and its thread context, as returned by the service.
    pub async fn get_post_thread(&self, uri: &str) -> Result<Value> {
        let session = self.session().await?;
        let resp: Value = Self::send_json(
            self.client
                .get(self.xrpc("app.bsky.feed.getPostThread"))
                .bearer_auth(&session.access_jwt)
                .query(&[("uri", uri)]),
        )
        .await?;
        Ok(resp.get("thread").cloned().unwrap_or(Value::Null))
    }
}

/// Polls Bluesky and posts on the agent's behalf.
pub struct BlueskyTrigger {
    client: BlueskyClient,
}

impl BlueskyTrigger {
    pub fn new(client: BlueskyClient) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(BlueskyClient::from_settings(settings))
    }

    pub fn client(&self) -> &BlueskyClient {
        &self.client
    }

    pub async fn post(&self, text: &str) -> Result<String> {
        self.client.post(text).await
    }

    pub async fn check_notifications(&self) -> Result<Vec<Notification>> {
        self.client.check_notifications().await
    }

    pub async fn get_post_thread(&self, uri: &str) -> Result<Value> {
        self.client.get_post_thread(uri).await
    }

    /// Reply text for a mention. No reply is generated yet.
    pub async fn handle_mention(&self, notification: &Notification) -> Option<String> {
        info!(author = %notification.author, "handling mention");
        None
    }

    /// Fetch unread notifications, handle mentions, and mark everything seen.
    ///
    /// Returns the number of unread notifications processed.
    pub async fn poll_and_respond(&self) -> Result<usize> {
        debug!(at = %Utc::now().to_rfc3339(), "polling Bluesky");
        let notifications = self.check_notifications().await?;

        for notification in notifications.iter().filter(|n| n.reason == "mention") {
            info!(author = %notification.author, "would respond to mention");
            if let Some(reply) = self.handle_mention(notification).await {
                self.post(&reply).await?;
            }
        }

        if !notifications.is_empty() {
            self.client.update_seen(Utc::now()).await?;
        }
        Ok(notifications.len())
    }
}
