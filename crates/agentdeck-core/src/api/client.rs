//! HTTP client for the orchestrator backend

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::model::{
    Agent, AgentPerformance, BackendConfig, BackendConfigPatch, Blueprint, ChatReply,
    ConfigUpdateAck, DailyActivity, Decision, HealthInfo, Suggestion,
};

/// Default request timeout when none is configured
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Typed client for the orchestrator REST API.
///
/// Cheap to clone; all methods take `&self`. The base URL is kept verbatim
/// (including any ingress prefix) and endpoint paths are joined under it.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Builder for creating an ApiClient
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Set the backend base URL (required)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::Config("backend base URL is required".to_string()))?;
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {}", raw, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base URL must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(
                self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .map_err(Error::Network)?;

        Ok(ApiClient { http, base_url })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Create a client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ApiClientBuilder::new().base_url(base_url).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join an endpoint path under the base URL, preserving any prefix
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Full agent snapshot
    pub async fn agents(&self) -> Result<Vec<Agent>> {
        let body = self.get_json("api/agents").await?;
        let array = expect_array("api/agents", body)?;
        serde_json::from_value(Value::Array(array)).map_err(|e| Error::MalformedPayload {
            endpoint: "api/agents".to_string(),
            reason: e.to_string(),
        })
    }

    /// Recent decisions, newest first, optionally scoped to one agent.
    ///
    /// Individual malformed records are dropped rather than failing the
    /// whole response; backends keep these as loose JSON log files.
    pub async fn decisions(&self, limit: usize, agent_id: Option<&str>) -> Result<Vec<Decision>> {
        let mut path = format!("api/decisions?limit={}", limit);
        if let Some(id) = agent_id {
            path.push_str(&format!("&agent_id={}", id));
        }
        let body = self.get_json(&path).await?;
        let array = expect_array("api/decisions", body)?;
        Ok(array.into_iter().filter_map(Decision::from_value).collect())
    }

    /// Per-day aggregate decision counts
    pub async fn daily_stats(&self) -> Result<Vec<DailyActivity>> {
        let body = self.get_json("api/stats/daily").await?;
        let array = expect_array("api/stats/daily", body)?;
        serde_json::from_value(Value::Array(array)).map_err(|e| Error::MalformedPayload {
            endpoint: "api/stats/daily".to_string(),
            reason: e.to_string(),
        })
    }

    /// Per-agent 24-hour performance rollup
    pub async fn performance_stats(&self) -> Result<BTreeMap<String, AgentPerformance>> {
        let body = self.get_json("api/stats/performance").await?;
        serde_json::from_value(body).map_err(|e| Error::MalformedPayload {
            endpoint: "api/stats/performance".to_string(),
            reason: e.to_string(),
        })
    }

    /// Candidate agent templates from the factory
    pub async fn suggestions(&self) -> Result<Vec<Suggestion>> {
        let body = self.get_json("api/factory/suggestions").await?;
        let array = expect_array("api/factory/suggestions", body)?;
        serde_json::from_value(Value::Array(array)).map_err(|e| Error::MalformedPayload {
            endpoint: "api/factory/suggestions".to_string(),
            reason: e.to_string(),
        })
    }

    /// Draft a new agent from a free-text prompt
    pub async fn generate_blueprint(&self, prompt: &str) -> Result<Blueprint> {
        self.post_json(
            "api/factory/generate",
            &serde_json::json!({ "prompt": prompt }),
        )
        .await
    }

    /// Persist an approved blueprint server-side
    pub async fn save_blueprint(&self, blueprint: &Blueprint) -> Result<()> {
        let _: Value = self
            .post_json("api/factory/save", &serde_json::json!({ "config": blueprint }))
            .await?;
        Ok(())
    }

    /// Edit an agent's instruction text
    pub async fn update_instruction(&self, agent_id: &str, instruction: &str) -> Result<()> {
        let url = self.endpoint(&format!("api/factory/agents/{}", agent_id));
        let response = self
            .http
            .patch(&url)
            .json(&serde_json::json!({ "instruction": instruction }))
            .send()
            .await
            .map_err(Error::Network)?;
        check_status(response).await.map(|_| ())
    }

    /// Remove an agent
    pub async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("api/factory/agents/{}", agent_id));
        let response = self.http.delete(&url).send().await.map_err(Error::Network)?;
        check_status(response).await.map(|_| ())
    }

    /// Read the backend settings snapshot
    pub async fn backend_config(&self) -> Result<BackendConfig> {
        let body = self.get_json("api/config").await?;
        serde_json::from_value(body).map_err(|e| Error::MalformedPayload {
            endpoint: "api/config".to_string(),
            reason: e.to_string(),
        })
    }

    /// Patch backend runtime settings (e.g. dry-run mode)
    pub async fn update_backend_config(
        &self,
        patch: &BackendConfigPatch,
    ) -> Result<ConfigUpdateAck> {
        let url = self.endpoint("api/config");
        let response = self
            .http
            .patch(&url)
            .json(patch)
            .send()
            .await
            .map_err(Error::Network)?;
        let body = check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| Error::MalformedPayload {
            endpoint: "api/config".to_string(),
            reason: e.to_string(),
        })
    }

    /// Send a natural-language command to the orchestrator
    pub async fn chat(&self, message: &str) -> Result<ChatReply> {
        self.post_json("api/chat", &serde_json::json!({ "message": message }))
            .await
    }

    /// Fetch the AI-generated visual dashboard document (HTML)
    pub async fn dynamic_dashboard(&self) -> Result<String> {
        let url = self.endpoint("api/dashboard/dynamic");
        let response = self.http.get(&url).send().await.map_err(Error::Network)?;
        check_status(response).await
    }

    /// Trigger regeneration of the visual dashboard
    pub async fn refresh_dashboard(&self) -> Result<()> {
        let url = self.endpoint("api/dashboard/refresh");
        let response = self.http.post(&url).send().await.map_err(Error::Network)?;
        check_status(response).await.map(|_| ())
    }

    /// Backend health summary
    pub async fn health(&self) -> Result<HealthInfo> {
        let body = self.get_json("api/health").await?;
        serde_json::from_value(body).map_err(|e| Error::MalformedPayload {
            endpoint: "api/health".to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.endpoint(path);
        debug!(url = %url, "GET");
        let response = self.http.get(&url).send().await.map_err(Error::Network)?;
        let body = check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| Error::MalformedPayload {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &impl serde::Serialize,
    ) -> Result<T> {
        let url = self.endpoint(path);
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(Error::Network)?;
        let body = check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| Error::MalformedPayload {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Capture status and body text; non-success becomes `Error::Api`
async fn check_status(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(Error::Network)?;
    if !status.is_success() {
        warn!(status = status.as_u16(), body = %body, "Backend request failed");
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Shape check: endpoints documented to return arrays must return arrays
fn expect_array(endpoint: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::MalformedPayload {
            endpoint: endpoint.to_string(),
            reason: format!("expected an array, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
