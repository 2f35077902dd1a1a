use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the five canonical tool sets an agent may carry. See spec §4.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolSpec {
    #[serde(rename = "web_search_preview")]
    WebSearchPreview,
    #[serde(rename = "file_search")]
    FileSearch { vector_store_ids: Vec<String> },
}

/// A remote agent definition, reconciled idempotently by the provisioning
/// supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub tools: Vec<ToolSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
}

/// A single content part inside a `responses` input message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
    InputImage { image_url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

impl InputMessage {
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// Builds the two-part user input described by spec §8 scenario 5:
/// the raw text and, when present, the admitted image as a passthrough
/// data URL.
pub fn build_user_input(text: &str, image_data_url: Option<&str>) -> InputMessage {
    let mut content = vec![ContentPart::InputText {
        text: text.to_string(),
    }];
    if let Some(url) = image_data_url {
        content.push(ContentPart::InputImage {
            image_url: url.to_string(),
        });
    }
    InputMessage::user(content)
}

#[derive(Debug, Clone, Serialize)]
pub struct TextFormat {
    pub format: Value,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ResponseRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    pub input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextFormat>,
}

/// The tagged-union model envelope. See spec §9 "Dual response envelopes"
/// and §4.7.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResponseEnvelope {
    pub output_text: Option<String>,
    pub output: Option<Vec<OutputItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUploadResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}
