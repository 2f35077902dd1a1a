use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::FoundryClient;
use crate::error::AgentClientError;
use crate::types::{AgentDefinition, ResponseEnvelope, ResponseRequest};

/// The C1 contract as a trait, so the pipeline and provisioning
/// supervisor can be exercised against a fake in tests. `FoundryClient`
/// is the only production implementation.
#[async_trait]
pub trait AgentService: Send + Sync {
    async fn create_response(&self, body: &ResponseRequest) -> Result<ResponseEnvelope, AgentClientError>;
    async fn list_agents_by_name(&self) -> Result<HashMap<String, String>, AgentClientError>;
    async fn create_agent(&self, def: &AgentDefinition) -> Result<String, AgentClientError>;
    async fn update_agent(&self, id: &str, def: &AgentDefinition) -> Result<(), AgentClientError>;
    async fn upload_file(&self, path: &Path) -> Result<String, AgentClientError>;
    async fn create_vector_store(&self, name: &str, file_ids: &[String]) -> Result<String, AgentClientError>;
    async fn wait_vector_store_ready(&self, id: &str, timeout: Duration) -> Result<(), AgentClientError>;
}

#[async_trait]
impl AgentService for FoundryClient {
    async fn create_response(&self, body: &ResponseRequest) -> Result<ResponseEnvelope, AgentClientError> {
        FoundryClient::create_response(self, body).await
    }

    async fn list_agents_by_name(&self) -> Result<HashMap<String, String>, AgentClientError> {
        FoundryClient::list_agents_by_name(self).await
    }

    async fn create_agent(&self, def: &AgentDefinition) -> Result<String, AgentClientError> {
        FoundryClient::create_agent(self, def).await
    }

    async fn update_agent(&self, id: &str, def: &AgentDefinition) -> Result<(), AgentClientError> {
        FoundryClient::update_agent(self, id, def).await
    }

    async fn upload_file(&self, path: &Path) -> Result<String, AgentClientError> {
        FoundryClient::upload_file(self, path).await
    }

    async fn create_vector_store(&self, name: &str, file_ids: &[String]) -> Result<String, AgentClientError> {
        FoundryClient::create_vector_store(self, name, file_ids).await
    }

    async fn wait_vector_store_ready(&self, id: &str, timeout: Duration) -> Result<(), AgentClientError> {
        FoundryClient::wait_vector_store_ready(self, id, timeout).await
    }
}
