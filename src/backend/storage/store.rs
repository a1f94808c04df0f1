/**
 * Snapshot file store
 *
 * Persists the whole `{members, photos}` document as pretty-printed JSON.
 * A missing file reads as an empty snapshot. Writes go to a sibling temp
 * file which is then renamed over the target, so a crash mid-write never
 * leaves a truncated document behind.
 */

use crate::backend::error::BackendError;
use crate::shared::models::Snapshot;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Snapshot, BackendError> {
        let bytes = self.read().await?;
        self.decode(&bytes)
    }

    /// Replace the stored snapshot, returning the previous one. `None` means
    /// the previous file did not parse and is overwritten anyway.
    pub async fn replace(&self, snapshot: &Snapshot) -> Result<Option<Snapshot>, BackendError> {
        let _guard = self.write_lock.lock().await;
        let bytes = self.read().await?;
        let previous = match self.decode(&bytes) {
            Ok(previous) => Some(previous),
            Err(e) => {
                tracing::warn!("[Storage] Overwriting unreadable snapshot: {}", e);
                None
            }
        };

        let body = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&temp, body).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(
            "[Storage] Saved {} members and {} photos to {}",
            snapshot.members.len(),
            snapshot.photos.len(),
            self.path.display()
        );
        Ok(previous)
    }

    async fn read(&self) -> Result<Vec<u8>, BackendError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Snapshot, BackendError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Snapshot::default());
        }
        serde_json::from_slice(bytes).map_err(|e| {
            BackendError::storage(format!("{} is corrupt: {}", self.path.display(), e))
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "data.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
