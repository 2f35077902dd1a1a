use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::AgentClientError;
use crate::retry::{self, MAX_ATTEMPTS};
use crate::token::{AccessToken, TokenProvider};
use crate::types::{
    AgentDefinition, FileUploadResponse, ResponseEnvelope, ResponseRequest, VectorStoreResponse,
};
use crate::types_ext::parse_agent_list;
use crate::url::compose_url;

pub struct FoundryClient {
    http: reqwest::Client,
    base_endpoint: String,
    api_version: String,
    token_provider: Arc<dyn TokenProvider>,
    cached_token: Mutex<Option<AccessToken>>,
}

impl FoundryClient {
    pub fn new(
        base_endpoint: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, AgentClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentClientError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_endpoint: base_endpoint.into(),
            api_version: api_version.into(),
            token_provider,
            cached_token: Mutex::new(None),
        })
    }

    fn url(&self, relative_path: &str) -> String {
        compose_url(&self.base_endpoint, relative_path, &self.api_version)
    }

    async fn bearer_token(&self) -> Result<String, AgentClientError> {
        let mut guard = self.cached_token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.still_fresh() {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.token_provider.fetch().await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    /// Executes requests through the retry policy in spec §4.1: up to
    /// six attempts, exponential backoff with jitter, `Retry-After`
    /// override, retries only transport errors and 429/5xx.
    async fn execute_with_retry<F>(&self, mut make_request: F) -> Result<reqwest::Response, AgentClientError>
    where
        F: FnMut(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let token = self.bearer_token().await?;
            let request = make_request(&self.http).bearer_auth(&token);
            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let is_last = attempt + 1 >= MAX_ATTEMPTS;
                    if !retry::is_retryable_status(status.as_u16()) || is_last {
                        let body = response.text().await.unwrap_or_default();
                        return Err(AgentClientError::Api {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(retry::parse_retry_after);
                    let delay = retry_after.unwrap_or_else(|| retry::backoff_delay(attempt));
                    tracing::warn!(status = status.as_u16(), attempt, "agent service returned a retryable status");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt + 1 >= MAX_ATTEMPTS {
                        return Err(AgentClientError::Network(err.to_string()));
                    }
                    let delay = retry::backoff_delay(attempt);
                    tracing::warn!(error = %err, attempt, "transport error calling agent service, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn create_response(&self, body: &ResponseRequest) -> Result<ResponseEnvelope, AgentClientError> {
        let url = self.url("openai/responses");
        let response = self
            .execute_with_retry(|client| client.post(&url).json(body))
            .await?;
        Ok(response.json::<ResponseEnvelope>().await?)
    }

    pub async fn list_agents_by_name(&self) -> Result<HashMap<String, String>, AgentClientError> {
        let url = self.url("openai/assistants");
        let response = self.execute_with_retry(|client| client.get(&url)).await?;
        let value: Value = response.json().await?;
        let records = parse_agent_list(&value);
        Ok(records
            .into_iter()
            .map(|r| (r.name.to_lowercase(), r.id))
            .collect())
    }

    pub async fn create_agent(&self, def: &AgentDefinition) -> Result<String, AgentClientError> {
        let url = self.url("openai/assistants");
        let response = self
            .execute_with_retry(|client| client.post(&url).json(def))
            .await?;
        let value: Value = response.json().await?;
        value
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AgentClientError::Parse("agent create response missing id".to_string()))
    }

    pub async fn update_agent(&self, id: &str, def: &AgentDefinition) -> Result<(), AgentClientError> {
        let url = self.url(&format!("openai/assistants/{id}"));
        self.execute_with_retry(|client| client.post(&url).json(def)).await?;
        Ok(())
    }

    pub async fn upload_file(&self, path: &Path) -> Result<String, AgentClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AgentClientError::Config(format!("failed to read seed file {}: {e}", path.display())))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let url = self.url("openai/files");

        let response = self
            .execute_with_retry(move |client| {
                let part = reqwest::multipart::Part::bytes(bytes.clone()).file_name(filename.clone());
                let form = reqwest::multipart::Form::new()
                    .text("purpose", "assistants")
                    .part("file", part);
                client.post(&url).multipart(form)
            })
            .await?;
        let parsed: FileUploadResponse = response.json().await?;
        Ok(parsed.id)
    }

    pub async fn create_vector_store(&self, name: &str, file_ids: &[String]) -> Result<String, AgentClientError> {
        let url = self.url("openai/vector_stores");
        let body = serde_json::json!({ "name": name, "file_ids": file_ids });
        let response = self.execute_with_retry(|client| client.post(&url).json(&body)).await?;
        let parsed: VectorStoreResponse = response.json().await?;
        Ok(parsed.id)
    }

    /// Polls at a fixed 2-second interval until the vector store reports
    /// `"completed"` or the timeout elapses. See spec §4.2/§5.
    pub async fn wait_vector_store_ready(&self, id: &str, timeout: Duration) -> Result<(), AgentClientError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let url = self.url(&format!("openai/vector_stores/{id}"));
        loop {
            let response = self.execute_with_retry(|client| client.get(&url)).await?;
            let parsed: VectorStoreResponse = response.json().await?;
            if parsed.status.as_deref() == Some("completed") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AgentClientError::Api {
                    status: 0,
                    body: format!("vector store {id} did not become ready within {timeout:?}"),
                });
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }
}
