//! API client for connecting to a Ralph orchestrator server.
//!
//! The REST side is abstracted by [`OrchestratorApi`] and the live log
//! stream by [`LogTransport`]; [`ApiClient`] implements both over HTTP.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ralph_live_core::client::{ApiClient, OrchestratorApi};
//!
//! #[tokio::main]
//! async fn main() -> ralph_live_core::Result<()> {
//!     let client = ApiClient::new("http://localhost:8080", None)?;
//!     let sessions = client.list_sessions().await?;
//!     println!("{} sessions", sessions.len());
//!     Ok(())
//! }
//! ```

mod sse;
#[cfg(test)]
mod test_server;

use crate::error::{Error, Result};
use crate::stream::frame;
use crate::types::*;
use async_trait::async_trait;
use futures::Stream;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout for REST calls. The event stream is exempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw text frames from a live log stream, in arrival order.
///
/// An `Err` item means the transport failed; the stream ends after it.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// REST operations against the orchestrator server.
#[async_trait]
pub trait OrchestratorApi: Send + Sync {
    /// Lightweight reachability check
    async fn health(&self) -> Result<HealthResponse>;

    /// List all known orchestrators
    async fn list_sessions(&self) -> Result<Vec<Orchestrator>>;

    /// Current status of one orchestrator
    async fn session_status(&self, orchestrator_id: &str) -> Result<Orchestrator>;

    /// Most recent log entries, oldest first. Malformed entries are skipped.
    async fn recent_logs(&self, orchestrator_id: &str, limit: u32) -> Result<Vec<LogEntry>>;

    async fn start(&self, request: &StartRequest) -> Result<StartResponse>;

    async fn stop(&self, orchestrator_id: &str) -> Result<CommandResponse>;

    async fn pause(&self, orchestrator_id: &str) -> Result<CommandResponse>;

    async fn resume(&self, orchestrator_id: &str) -> Result<CommandResponse>;
}

/// Opens a live frame stream for one orchestrator.
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Resolve once the handshake succeeds. `last_event_id` asks the server
    /// to resume after that entry.
    async fn open(&self, orchestrator_id: &str, last_event_id: Option<&str>)
    -> Result<FrameStream>;
}

/// HTTP client for the orchestrator server
#[derive(Clone)]
pub struct ApiClient {
    /// Base URL without trailing slash
    base_url: String,
    /// Bearer token
    token: Option<String>,
    /// HTTP client
    client: reqwest::Client,
}

/// Server error body: `{"error": "session_not_found"}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("API URL is empty".into()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build request with auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, self.url(path));
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(reqwest::Method::GET, path, Option::<()>::None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(reqwest::Method::DELETE, path, Option::<()>::None).await
    }

    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T> {
        debug!("API request: {} {}", method, path);

        let mut req = self.request(method, path).timeout(REQUEST_TIMEOUT);
        if let Some(ref b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            let data: T = resp
                .json()
                .await
                .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))?;
            Ok(data)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(Error::NotFound(path.to_string()))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::api(status.as_u16(), error_message(&text)))
        }
    }
}

/// Prefer the server's `error` field over the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "empty response".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl OrchestratorApi for ApiClient {
    async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    async fn list_sessions(&self) -> Result<Vec<Orchestrator>> {
        self.get("/api/sessions").await
    }

    async fn session_status(&self, orchestrator_id: &str) -> Result<Orchestrator> {
        self.get(&format!("/api/sessions/{}/status", orchestrator_id))
            .await
    }

    async fn recent_logs(&self, orchestrator_id: &str, limit: u32) -> Result<Vec<LogEntry>> {
        let raw: Vec<serde_json::Value> = self
            .get(&format!("/api/sessions/{}/logs?limit={}", orchestrator_id, limit))
            .await?;
        Ok(raw.into_iter().filter_map(frame::decode_value).collect())
    }

    async fn start(&self, request: &StartRequest) -> Result<StartResponse> {
        self.post("/api/sessions", request).await
    }

    async fn stop(&self, orchestrator_id: &str) -> Result<CommandResponse> {
        self.delete(&format!("/api/sessions/{}", orchestrator_id))
            .await
    }

    async fn pause(&self, orchestrator_id: &str) -> Result<CommandResponse> {
        self.post(
            &format!("/api/sessions/{}/pause", orchestrator_id),
            &serde_json::json!({}),
        )
        .await
    }

    async fn resume(&self, orchestrator_id: &str) -> Result<CommandResponse> {
        self.post(
            &format!("/api/sessions/{}/resume", orchestrator_id),
            &serde_json::json!({}),
        )
        .await
    }
}
