use crate::config::Config;
use crate::errors::ApiError;
use crate::observability::telemetry::{redact_secrets, sanitize_for_log, track_request};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[cfg(test)]
pub mod mock_server;
pub mod types;

use types::*;

/// Trait abstraction over the platform API, enabling test mocking.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn create_workflow(&self, scope: &Scope, body: &Value) -> Result<Value>;

    async fn update_workflow(&self, scope: &Scope, workflow: &str, body: &Value)
        -> Result<Value>;

    async fn get_workflow(&self, scope: &Scope, workflow: &str) -> Result<Value>;

    async fn delete_workflow(&self, scope: &Scope, workflow: &str) -> Result<Value>;

    async fn list_workflows(&self, scope: &Scope) -> Result<Value>;

    async fn list_artifacts(&self, scope: &Scope, workflow: &str) -> Result<Value>;

    async fn create_workflow_run(
        &self,
        scope: &Scope,
        workflow: &str,
        body: &Value,
    ) -> Result<Value>;

    /// Ask the platform for a presigned URL to upload a Terraform state file.
    async fn tfstate_upload_url(&self, scope: &Scope, workflow: &str) -> Result<String>;

    /// PUT a state file to a presigned URL returned by `tfstate_upload_url`.
    async fn upload_tfstate(&self, upload_url: &str, state: Vec<u8>) -> Result<()>;

    async fn create_stack(&self, scope: &Scope, body: &Value, run_on_create: bool)
        -> Result<Value>;

    async fn get_stack(&self, scope: &Scope, stack: &str) -> Result<Value>;

    async fn run_stack(&self, scope: &Scope, stack: &str, action: RunAction) -> Result<Value>;

    async fn stack_outputs(&self, scope: &Scope, stack: &str) -> Result<Value>;
}

/// Retry configuration for API calls
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
    /// HTTP status codes that should trigger a retry
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
            retryable_status_codes: vec![429, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn from_settings(settings: &crate::config::RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay_ms: settings.base_delay_ms,
            max_delay_ms: settings.max_delay_ms,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64 << attempt.saturating_sub(1).min(20);
        self.initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

/// Build `{base_url}/api/v1/{segments...}`.
///
/// Every segment is percent-encoded on its own, so identifiers containing
/// `/` or `?` cannot change the path. With `trailing_slash` the path ends in
/// `/`, which is how most platform endpoints are registered.
pub fn api_url(base_url: &str, segments: &[&str], trailing_slash: bool) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .with_context(|| format!("Invalid API base URL: {}", base_url))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot be a base: {}", base_url))?;
        path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        if trailing_slash {
            path.push("");
        }
    }
    Ok(url)
}

/// Map a non-success response to a typed error.
pub fn classify_status(status: StatusCode, body: &str) -> ApiError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Authentication(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        s if s.is_client_error() && message.to_lowercase().contains("not unique") => {
            ApiError::Conflict(message)
        }
        s => ApiError::HttpStatus {
            status: s.as_u16(),
            message,
        },
    }
}

/// Pull a readable message out of an error body: the `msg` field when the
/// body is JSON, the trimmed text otherwise.
fn error_message(body: &str) -> String {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("msg") {
            Some(Value::String(msg)) => msg.clone(),
            Some(other) => other.to_string(),
            None => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    };
    redact_secrets(&sanitize_for_log(&text))
}

/// Parse a success body. Empty bodies become `null`; bodies that are not
/// JSON are returned as a JSON string.
pub fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

pub struct ApiClient {
    client: Client,
    config: Config,
    retry_config: RetryConfig,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("sg-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config: config.clone(),
            retry_config: RetryConfig::from_settings(&config.retry),
        })
    }

    /// Create client with custom retry configuration
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    fn url(&self, scope: &Scope, tail: &[&str], trailing_slash: bool) -> Result<Url> {
        let mut segments = vec![
            "orgs",
            scope.org.as_str(),
            "wfgrps",
            scope.workflow_group.as_str(),
        ];
        segments.extend_from_slice(tail);
        api_url(&self.config.base_url, &segments, trailing_slash)
    }

    /// Send an authenticated request with exponential backoff retry logic.
    ///
    /// POST requests are only retried when the request never reached the
    /// server (connect errors) or the server asked for it (429/502/503/504).
    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        let token = self.config.require_token()?;
        let safe_url = redact_secrets(url.as_str());
        let idempotent = method != Method::POST;
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..=self.retry_config.max_retries {
            if attempt > 0 {
                let delay_ms = with_jitter(self.retry_config.backoff_ms(attempt));
                warn!(
                    "Retry attempt {}/{} after {}ms delay",
                    attempt, self.retry_config.max_retries, delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            debug!("{} {} (attempt {})", method, safe_url, attempt + 1);

            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header(AUTHORIZATION, format!("apikey {}", token))
                .header(ACCEPT, "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let text = response
                        .text()
                        .await
                        .map_err(|e| ApiError::Network(e.to_string()))?;

                    if status.is_success() {
                        debug!("API response {} ({} bytes)", status, text.len());
                        return Ok(parse_body(&text));
                    }

                    let error = classify_status(status, &text);
                    if self
                        .retry_config
                        .retryable_status_codes
                        .contains(&status.as_u16())
                    {
                        warn!("Retryable error ({}): {}", status, error);
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error.into());
                }
                Err(e) if e.is_connect() => {
                    warn!("Network error (retrying): {}", redact_secrets(&e.to_string()));
                    last_error = Some(ApiError::Network(e.to_string()));
                }
                Err(e) if e.is_timeout() && idempotent => {
                    warn!("Request timed out (retrying)");
                    last_error = Some(ApiError::Timeout);
                }
                Err(e) if e.is_timeout() => return Err(ApiError::Timeout.into()),
                Err(e) => return Err(ApiError::Network(e.to_string()).into()),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::Network("request failed after retries".to_string()))
            .into())
    }

    /// Upload a state file to a presigned URL. The URL carries its own
    /// credentials, so no `Authorization` header is sent and nothing is retried.
    async fn put_state(&self, url: Url, state: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .put(url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(CONTENT_TYPE, "application/json")
            .body(state)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(classify_status(status, &text).into())
    }
}

#[async_trait]
impl PlatformApi for ApiClient {
    async fn create_workflow(&self, scope: &Scope, body: &Value) -> Result<Value> {
        let url = self.url(scope, &["wfs"], true)?;
        track_request("create_workflow", || self.send(Method::POST, url, Some(body))).await
    }

    async fn update_workflow(
        &self,
        scope: &Scope,
        workflow: &str,
        body: &Value,
    ) -> Result<Value> {
        let url = self.url(scope, &["wfs", workflow], true)?;
        track_request("update_workflow", || self.send(Method::PATCH, url, Some(body))).await
    }

    async fn get_workflow(&self, scope: &Scope, workflow: &str) -> Result<Value> {
        let url = self.url(scope, &["wfs", workflow], true)?;
        track_request("get_workflow", || self.send(Method::GET, url, None)).await
    }

    async fn delete_workflow(&self, scope: &Scope, workflow: &str) -> Result<Value> {
        let url = self.url(scope, &["wfs", workflow], true)?;
        track_request("delete_workflow", || self.send(Method::DELETE, url, None)).await
    }

    async fn list_workflows(&self, scope: &Scope) -> Result<Value> {
        let url = self.url(scope, &["wfs", "listall"], true)?;
        track_request("list_workflows", || self.send(Method::GET, url, None)).await
    }

    async fn list_artifacts(&self, scope: &Scope, workflow: &str) -> Result<Value> {
        let url = self.url(scope, &["wfs", workflow, "listall_artifacts"], true)?;
        track_request("list_artifacts", || self.send(Method::GET, url, None)).await
    }

    async fn create_workflow_run(
        &self,
        scope: &Scope,
        workflow: &str,
        body: &Value,
    ) -> Result<Value> {
        let url = self.url(scope, &["wfs", workflow, "wfruns"], true)?;
        track_request("create_workflow_run", || {
            self.send(Method::POST, url, Some(body))
        })
        .await
    }

    async fn tfstate_upload_url(&self, scope: &Scope, workflow: &str) -> Result<String> {
        let url = self.url(scope, &["wfs", workflow, "tfstate_upload_url"], false)?;
        let response =
            track_request("tfstate_upload_url", || self.send(Method::GET, url, None)).await?;
        let parsed: TfStateUploadUrl = serde_json::from_value(response)
            .map_err(|e| ApiError::Parse(format!("tfstate upload url: {}", e)))?;
        Ok(parsed.msg)
    }

    async fn upload_tfstate(&self, upload_url: &str, state: Vec<u8>) -> Result<()> {
        let url = Url::parse(upload_url)
            .map_err(|e| ApiError::Parse(format!("invalid state upload URL: {}", e)))?;
        debug!("PUT {} ({} bytes)", redact_secrets(url.as_str()), state.len());
        track_request("upload_tfstate", || self.put_state(url, state)).await
    }

    async fn create_stack(
        &self,
        scope: &Scope,
        body: &Value,
        run_on_create: bool,
    ) -> Result<Value> {
        let mut url = self.url(scope, &["stacks"], true)?;
        url.query_pairs_mut()
            .append_pair("runOnCreate", if run_on_create { "true" } else { "false" });
        track_request("create_stack", || self.send(Method::POST, url, Some(body))).await
    }

    async fn get_stack(&self, scope: &Scope, stack: &str) -> Result<Value> {
        let url = self.url(scope, &["stacks", stack], true)?;
        track_request("get_stack", || self.send(Method::GET, url, None)).await
    }

    async fn run_stack(&self, scope: &Scope, stack: &str, action: RunAction) -> Result<Value> {
        let url = self.url(scope, &["stacks", stack, "runs"], true)?;
        let body = stack_run_body(action);
        track_request("run_stack", || self.send(Method::POST, url, Some(&body))).await
    }

    async fn stack_outputs(&self, scope: &Scope, stack: &str) -> Result<Value> {
        let url = self.url(scope, &["stacks", stack, "outputs"], true)?;
        track_request("stack_outputs", || self.send(Method::GET, url, None)).await
    }
}

/// Spread a delay by up to ±10% so concurrent clients don't retry in lockstep.
fn with_jitter(delay_ms: u64) -> u64 {
    let spread = delay_ms as f64 * 0.1 * (rand::random::<f64>() * 2.0 - 1.0);
    (delay_ms as f64 + spread).max(0.0) as u64
}
