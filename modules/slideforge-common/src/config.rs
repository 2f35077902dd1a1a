use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration loaded from environment variables. See spec §6.3.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub foundry_project_endpoint: String,
    pub foundry_api_version: String,
    pub model_deployment_name: String,
    pub foundry_http_timeout: Duration,
    pub seed_data_dir: PathBuf,
    pub state_store: StateStoreKind,
    pub state_local_path: PathBuf,
    pub job_data_dir: PathBuf,
    pub allow_html_download: bool,
    pub html_download_api_key: Option<String>,
    pub cors_allowed_origins: Vec<String>,
    pub bind_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateStoreKind {
    Local,
    Other,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let foundry_project_endpoint = require("FOUNDRY_PROJECT_ENDPOINT")?;
        let model_deployment_name = require("MODEL_DEPLOYMENT_NAME")?;

        let foundry_api_version = std::env::var("FOUNDRY_API_VERSION")
            .unwrap_or_else(|_| "2025-11-15-preview".to_string());

        let timeout_secs: u64 = parse_or_default("FOUNDRY_HTTP_TIMEOUT_SECONDS", 600)?;
        let timeout_secs = timeout_secs.clamp(10, 600);

        let seed_data_dir = std::env::var("SEED_DATA_DIR")
            .unwrap_or_else(|_| "seed-data".to_string())
            .into();

        let state_store = match std::env::var("STATE_STORE")
            .unwrap_or_else(|_| "local".to_string())
            .as_str()
        {
            "local" => StateStoreKind::Local,
            _ => StateStoreKind::Other,
        };

        let state_local_path = std::env::var("STATE_LOCAL_PATH")
            .unwrap_or_else(|_| "data/state.json".to_string())
            .into();

        let job_data_dir = std::env::var("JOB_DATA_DIR")
            .unwrap_or_else(|_| "data/jobs".to_string())
            .into();

        let allow_html_download: bool = parse_or_default("ALLOW_HTML_DOWNLOAD", false)?;
        let html_download_api_key = std::env::var("HTML_DOWNLOAD_API_KEY").ok();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let bind_port: u16 = parse_or_default("PORT", 8080)?;

        let config = Self {
            foundry_project_endpoint,
            foundry_api_version,
            model_deployment_name,
            foundry_http_timeout: Duration::from_secs(timeout_secs),
            seed_data_dir,
            state_store,
            state_local_path,
            job_data_dir,
            allow_html_download,
            html_download_api_key,
            cors_allowed_origins,
            bind_port,
        };

        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        tracing::info!(
            endpoint = %self.foundry_project_endpoint,
            api_version = %self.foundry_api_version,
            model = %self.model_deployment_name,
            timeout_s = self.foundry_http_timeout.as_secs(),
            allow_html_download = self.allow_html_download,
            html_download_key_set = self.html_download_api_key.is_some(),
            "Config loaded",
        );
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_or_default<T: std::str::FromStr>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}
