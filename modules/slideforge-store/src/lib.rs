pub mod atomic;
pub mod error;
pub mod state_store;

pub use error::StoreError;
pub use state_store::StateStore;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use slideforge_common::image::{decode_data_url, encode_data_url, ImageFormat};
use slideforge_common::{Aspect, JobInput, JobState};
use tokio::sync::Mutex;

/// Filesystem-backed durable job store. See spec §4.3/§6.2.
///
/// `{root}/{jobId}/` holds `request.json`, `state.json`, an optional
/// `input.{png|jpg}`, `result.html`, and `preview.png`.
pub struct JobStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join(job_id)
    }

    async fn lock_for(&self, job_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn create(
        &self,
        job_id: &str,
        prompt: &str,
        aspect: Aspect,
        image_data_url: Option<&str>,
    ) -> Result<(), StoreError> {
        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir).await?;

        if let Some(url) = image_data_url {
            let (format, bytes) = decode_data_url(url)?;
            let path = dir.join(format!("input.{}", format.extension()));
            atomic::write_atomic(&path, &bytes).await?;
        }

        let request = JobInput {
            job_id: job_id.to_string(),
            prompt: prompt.to_string(),
            aspect,
            image_data_url: image_data_url.map(|s| s.to_string()),
        };
        let request_bytes = serde_json::to_vec_pretty(&request)?;
        atomic::write_atomic(&dir.join("request.json"), &request_bytes).await?;

        let state = JobState::new(job_id);
        let state_bytes = serde_json::to_vec_pretty(&state)?;
        atomic::write_atomic(&dir.join("state.json"), &state_bytes).await?;

        Ok(())
    }

    pub async fn get(&self, job_id: &str) -> Result<Option<JobState>, StoreError> {
        let path = self.job_dir(job_id).join("state.json");
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mut state: JobState = serde_json::from_slice(&bytes)?;
                state.sources.rebuild_index();
                Ok(Some(state))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Reconstructs `JobInput` from the stored request and image bytes,
    /// re-deriving the data URL by magic-byte sniffing rather than
    /// trusting a stored MIME label. See spec §4.3.
    pub async fn get_input(&self, job_id: &str) -> Result<Option<JobInput>, StoreError> {
        let dir = self.job_dir(job_id);
        let request_path = dir.join("request.json");
        let mut request: JobInput = match tokio::fs::read(&request_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        for format in [ImageFormat::Png, ImageFormat::Jpeg] {
            let path = dir.join(format!("input.{}", format.extension()));
            if let Ok(bytes) = tokio::fs::read(&path).await {
                if let Some(sniffed) = ImageFormat::sniff(&bytes) {
                    request.image_data_url = Some(encode_data_url(sniffed, &bytes));
                    break;
                }
            }
        }

        Ok(Some(request))
    }

    /// Reads state, applies `mutator`, bumps `updatedAt`, and rewrites
    /// the file, under a per-job mutex acquired from a lazily-populated
    /// registry. See spec §4.3/§9.
    pub async fn update<F>(&self, job_id: &str, mutator: F) -> Result<JobState, StoreError>
    where
        F: FnOnce(&mut JobState),
    {
        let lock = self.lock_for(job_id).await;
        let _guard = lock.lock().await;

        let mut state = self
            .get(job_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))?;

        mutator(&mut state);
        state.updated_at = Utc::now();

        let bytes = serde_json::to_vec_pretty(&state)?;
        atomic::write_atomic(&self.job_dir(job_id).join("state.json"), &bytes).await?;

        Ok(state)
    }

    /// Writes the HTML artifact, then updates the state's path field.
    /// The artifact lands on disk before the state update, so a
    /// concurrent reader who observes the path always finds the file.
    pub async fn save_html(&self, job_id: &str, html: &str) -> Result<(), StoreError> {
        let path = self.job_dir(job_id).join("result.html");
        atomic::write_atomic(&path, html.as_bytes()).await?;
        self.update(job_id, |s| {
            s.result_html_path = Some(path_to_string(&path));
        })
        .await?;
        Ok(())
    }

    pub async fn save_preview_png(&self, job_id: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.job_dir(job_id).join("preview.png");
        atomic::write_atomic(&path, bytes).await?;
        self.update(job_id, |s| {
            s.preview_png_path = Some(path_to_string(&path));
        })
        .await?;
        Ok(())
    }
}

fn path_to_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slideforge_common::JobStatus;

    #[tokio::test]
    async fn create_then_get_round_trips_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());

        store.create("job-1", "hello", Aspect::Widescreen, None).await.unwrap();
        let state = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(state.status, JobStatus::Queued);
        assert!(state.step.is_none());
    }

    #[tokio::test]
    async fn update_is_idempotent_modulo_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        store.create("job-1", "hello", Aspect::Widescreen, None).await.unwrap();

        let first = store.update("job-1", |_s| {}).await.unwrap();
        let second = store.update("job-1", |_s| {}).await.unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.step, second.step);
        assert_eq!(first.sources.urls.as_slice(), second.sources.urls.as_slice());
    }

    #[tokio::test]
    async fn status_never_regresses_through_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        store.create("job-1", "hello", Aspect::Widescreen, None).await.unwrap();

        store.update("job-1", |s| s.status = JobStatus::Running).await.unwrap();
        let state = store.update("job-1", |s| s.status = JobStatus::Succeeded).await.unwrap();
        assert_eq!(state.status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn save_html_writes_file_before_recording_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        store.create("job-1", "hello", Aspect::Widescreen, None).await.unwrap();

        store.save_html("job-1", "<html></html>").await.unwrap();
        let state = store.get("job-1").await.unwrap().unwrap();
        let path = state.result_html_path.unwrap();
        assert!(tokio::fs::metadata(&path).await.is_ok());
    }

    #[tokio::test]
    async fn get_input_reconstructs_data_url_from_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());

        let mut png_bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        png_bytes.extend_from_slice(b"body");
        let data_url = encode_data_url(ImageFormat::Png, &png_bytes);

        store
            .create("job-1", "hello", Aspect::Widescreen, Some(&data_url))
            .await
            .unwrap();

        let input = store.get_input("job-1").await.unwrap().unwrap();
        let reconstructed = input.image_data_url.unwrap();
        assert!(reconstructed.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path());
        assert!(store.get("missing").await.unwrap().is_none());
    }
}
