use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::atomic::write_atomic;
use crate::error::StoreError;

/// The auxiliary key-value store named in spec §1/§6.2: a single JSON
/// file mapping string to string, rewritten wholesale under a
/// process-wide mutex. Used to persist `vectorStoreId` across restarts.
pub struct StateStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.guard.lock().await;
        Ok(self.read_map().await?.get(key).cloned())
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.guard.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        let bytes = serde_json::to_vec_pretty(&map)?;
        write_atomic(&self.path, &bytes).await?;
        Ok(())
    }

    async fn read_map(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}
