use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("agent service error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse agent service response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AgentClientError {
    fn from(err: reqwest::Error) -> Self {
        AgentClientError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AgentClientError {
    fn from(err: serde_json::Error) -> Self {
        AgentClientError::Parse(err.to_string())
    }
}
