use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use slideforge_common::{Aspect, JobStatus};
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::AppState;

const MAX_PROMPT_CHARS: usize = 10_000;
const MAX_IMAGE_SOURCE_CHARS: usize = 12_000_000;
const MAX_IMAGE_DECODED_BYTES: usize = 4 * 1024 * 1024;

#[derive(Deserialize)]
pub struct GenerateRequest {
    prompt: String,
    aspect: String,
    #[serde(rename = "imageBase64")]
    image_base64: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
    #[serde(rename = "jobId")]
    job_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// `POST /api/generate`. See spec §6.1.
pub async fn generate(State(state): State<Arc<AppState>>, Json(body): Json<GenerateRequest>) -> axum::response::Response {
    let validated = match validate_request(&body) {
        Ok(v) => v,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    let job_id = slideforge_common::new_job_id();
    if let Err(err) = state
        .store
        .create(&job_id, &validated.prompt, validated.aspect, validated.image_data_url.as_deref())
        .await
    {
        warn!(error = %err, "failed to create job record");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    if let Err(err) = state.queue.enqueue(job_id.clone()) {
        warn!(error = %err, "failed to enqueue job");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    info!(job_id, "job accepted");
    (StatusCode::OK, Json(GenerateResponse { job_id })).into_response()
}

struct ValidatedRequest {
    prompt: String,
    aspect: Aspect,
    image_data_url: Option<String>,
}

fn validate_request(body: &GenerateRequest) -> Result<ValidatedRequest, ValidationError> {
    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return Err(ValidationError::PromptRequired);
    }
    if body.prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ValidationError::PromptTooLong(MAX_PROMPT_CHARS));
    }

    let aspect = Aspect::parse(&body.aspect).ok_or(ValidationError::InvalidAspect)?;

    let image_data_url = match &body.image_base64 {
        None => None,
        Some(raw) => Some(normalize_image_input(raw)?),
    };

    Ok(ValidatedRequest {
        prompt: body.prompt.clone(),
        aspect,
        image_data_url,
    })
}

fn normalize_image_input(raw: &str) -> Result<String, ValidationError> {
    if raw.len() > MAX_IMAGE_SOURCE_CHARS {
        return Err(ValidationError::ImageTooLong);
    }

    let data_url = if raw.starts_with("data:") {
        raw.to_string()
    } else {
        format!("data:application/octet-stream;base64,{raw}")
    };

    let (format, bytes) = slideforge_common::image::decode_data_url(&data_url).map_err(|_| ValidationError::InvalidImage)?;

    if bytes.len() > MAX_IMAGE_DECODED_BYTES {
        return Err(ValidationError::ImageTooLarge(MAX_IMAGE_DECODED_BYTES));
    }

    Ok(slideforge_common::image::encode_data_url(format, &bytes))
}

#[derive(Serialize)]
struct SourcesResponse {
    urls: Vec<String>,
    files: Vec<String>,
}

#[derive(Serialize)]
struct JobStatusResponse {
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(rename = "previewPngUrl", skip_serializing_if = "Option::is_none")]
    preview_png_url: Option<String>,
    sources: SourcesResponse,
}

/// `GET /api/jobs/{jobId}`. See spec §6.1.
pub async fn get_job(State(state): State<Arc<AppState>>, Path(job_id): Path<String>) -> axum::response::Response {
    let state_record = match state.store.get(&job_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            warn!(error = %err, "failed to read job state");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let preview_png_url = if state_record.status == JobStatus::Succeeded && state_record.preview_png_path.is_some() {
        Some(format!("/api/jobs/{job_id}/preview.png"))
    } else {
        None
    };

    let response = JobStatusResponse {
        status: state_record.status,
        step: state_record.step.map(|s| s.label()),
        error: state_record.error,
        preview_png_url,
        sources: SourcesResponse {
            urls: state_record.sources.urls.as_slice().to_vec(),
            files: state_record.sources.files.as_slice().to_vec(),
        },
    };

    Json(response).into_response()
}

/// `GET /api/jobs/{jobId}/preview.png`. See spec §6.1.
pub async fn get_preview(State(state): State<Arc<AppState>>, Path(job_id): Path<String>) -> axum::response::Response {
    let state_record = match state.store.get(&job_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    if state_record.status != JobStatus::Succeeded {
        return StatusCode::NOT_FOUND.into_response();
    }
    let Some(path) = state_record.preview_png_path else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(axum::http::header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `GET /api/jobs/{jobId}/result.html`. See spec §6.1.
pub async fn get_result_html(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> axum::response::Response {
    if !state.config.allow_html_download {
        return StatusCode::NOT_FOUND.into_response();
    }

    if let Some(expected_key) = &state.config.html_download_api_key {
        let provided = headers.get("X-Download-Key").and_then(|v| v.to_str().ok());
        if provided != Some(expected_key.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let state_record = match state.store.get(&job_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };
    let Some(path) = state_record.result_html_path else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (axum::http::header::CONTENT_TYPE, "text/html".to_string()),
                (
                    axum::http::header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{job_id}.html\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
