use std::path::Path;

use tokio::io::AsyncWriteExt;

/// Writes `bytes` to `path` by writing to a sibling temp file and
/// renaming over the target, so a concurrent reader never observes a
/// partially-written artifact. See spec §4.3/§5.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("tmp")
    ));

    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_and_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("state.json");

        write_atomic(&target, b"{\"a\":1}").await.unwrap();

        let contents = tokio::fs::read(&target).await.unwrap();
        assert_eq!(contents, b"{\"a\":1}");

        let tmp = dir.path().join("state.json.tmp");
        assert!(!tmp.exists());
    }
}
