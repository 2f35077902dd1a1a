pub mod client;
pub mod error;
pub mod retry;
pub mod service;
pub mod token;
pub mod types;
pub mod types_ext;
pub mod url;

pub use client::FoundryClient;
pub use error::AgentClientError;
pub use service::AgentService;
pub use token::{AccessToken, EnvTokenProvider, TokenProvider};
pub use types::{
    AgentDefinition, AgentRecord, ContentPart, InputMessage, OutputContent, OutputItem,
    ResponseEnvelope, ResponseRequest, TextFormat, ToolSpec, build_user_input,
};
