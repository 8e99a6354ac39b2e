use async_trait::async_trait;
use nameless_config::Settings;
use nameless_core::{NamelessError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::backend::*;
use crate::types::*;

/// Letta v1 REST client.
pub struct LettaClient {
    client: Client,
    base_url: Url,
    credential: Option<String>,
}

/// Search responses come either as a bare list or wrapped in `results`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Bare(Vec<PassageHit>),
    Wrapped { results: Vec<PassageHit> },
}

impl LettaClient {
    /// Build a client for `base_url`, sending `credential` as a bearer token when present.
    pub fn new(base_url: &str, credential: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| NamelessError::ConfigValidation {
            field: "letta.base_url".into(),
            reason: format!("'{}': {}", base_url, e),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(NamelessError::ConfigValidation {
                field: "letta.base_url".into(),
                reason: format!("'{}' is not an http(s) URL", base_url),
            });
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            credential: credential.filter(|c| !c.is_empty()),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.letta.base_url,
            settings.letta.credential().map(str::to_string),
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NamelessError::Config(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "letta request");
        let builder = self.client.request(method, url);
        Ok(match &self.credential {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(builder: RequestBuilder) -> Result<Response> {
        let resp = builder
            .send()
            .await
            .map_err(|e| NamelessError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NamelessError::Backend { status, body });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let resp = Self::send(builder).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| NamelessError::Transport(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl MemoryBackend for LettaClient {
    async fn retrieve_block(&self, agent_id: &str, label: &str) -> Result<Block> {
        let req = self.request(
            Method::GET,
            &["agents", agent_id, "core-memory", "blocks", label],
        )?;
        Self::send_json(req).await
    }

    async fn update_block(&self, agent_id: &str, label: &str, value: &str) -> Result<Block> {
        let req = self
            .request(
                Method::PATCH,
                &["agents", agent_id, "core-memory", "blocks", label],
            )?
            .json(&serde_json::json!({ "value": value }));
        Self::send_json(req).await
    }

    async fn list_blocks(&self, agent_id: &str) -> Result<Vec<Block>> {
        let req = self.request(Method::GET, &["agents", agent_id, "core-memory", "blocks"])?;
        Self::send_json(req).await
    }

    async fn search_passages(
        &self,
        agent_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<PassageHit>> {
        let req = self
            .request(
                Method::GET,
                &["agents", agent_id, "archival-memory", "search"],
            )?
            .query(&[("query", query.to_string()), ("top_k", top_k.to_string())]);
        let resp: SearchResponse = Self::send_json(req).await?;
        Ok(match resp {
            SearchResponse::Bare(hits) => hits,
            SearchResponse::Wrapped { results } => results,
        })
    }

    async fn create_passage(
        &self,
        agent_id: &str,
        text: &str,
        tags: Option<&[String]>,
    ) -> Result<Vec<Passage>> {
        let mut body = serde_json::json!({ "text": text });
        if let Some(tags) = tags {
            body["tags"] = serde_json::json!(tags);
        }
        let req = self
            .request(Method::POST, &["agents", agent_id, "archival-memory"])?
            .json(&body);
        Self::send_json(req).await
    }

    async fn list_passages(&self, agent_id: &str, page: &PassagePage) -> Result<Vec<Passage>> {
        let mut query = vec![("limit", page.limit.to_string())];
        if let Some(ref after) = page.after {
            query.push(("after", after.clone()));
        }
        let req = self
            .request(Method::GET, &["agents", agent_id, "archival-memory"])?
            .query(&query);
        Self::send_json(req).await
    }

    async fn list_messages(&self, agent_id: &str, limit: usize) -> Result<Vec<LettaMessage>> {
        let req = self
            .request(Method::GET, &["agents", agent_id, "messages"])?
            .query(&[("limit", limit.to_string())]);
        Self::send_json(req).await
    }

    async fn retrieve_agent(&self, agent_id: &str) -> Result<AgentSummary> {
        let req = self.request(Method::GET, &["agents", agent_id])?;
        Self::send_json(req).await
    }

    async fn export_agent_file(&self, agent_id: &str) -> Result<String> {
        let req = self.request(Method::GET, &["agents", agent_id, "export"])?;
        let resp = Self::send(req).await?;
        resp.text()
            .await
            .map_err(|e| NamelessError::Transport(e.to_string()))
    }

    async fn import_agent_file(&self, upload: AgentUpload) -> Result<ImportResponse> {
        let AgentUpload {
            file_name,
            contents,
            overrides,
        } = upload;

        let mut form = Form::new().part("file", Part::bytes(contents).file_name(file_name));
        if let Some(name) = overrides.name {
            form = form.text("name", name);
        }
        if let Some(model) = overrides.model {
            form = form.text("model", model);
        }
        if let Some(embedding) = overrides.embedding {
            form = form.text("embedding", embedding);
        }

        let req = self
            .request(Method::POST, &["agents", "import"])?
            .multipart(form);
        Self::send_json(req).await
    }
}
