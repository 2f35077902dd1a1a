use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("agent service error: {0}")]
    Agent(#[from] agent_client::AgentClientError),

    #[error("job store error: {0}")]
    Store(#[from] slideforge_store::StoreError),

    #[error("renderer error: {0}")]
    Render(#[from] render_client::RenderError),

    #[error("failed to parse model output: {0}")]
    Parse(String),

    #[error("job input not found: {0}")]
    MissingInput(String),

    #[error("{0}")]
    ValidationExhausted(String),

    #[error("pipeline cancelled")]
    Cancelled,
}
