//! Local filesystem storage implementation.
//!
//! The whole history is rewritten on every save: the new content goes to a
//! temporary file next to the target, which is then renamed over it, so a
//! crash mid-write leaves the previous file intact.
//!
//! Content that cannot be parsed is moved to a timestamped
//! `<file>.corrupt-<stamp>` next to it. Earlier quarantined copies are
//! never overwritten.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::SeenSet;
use crate::storage::{SeenStore, StateFile};

/// JSON file backed history.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    file_name: String,
}

impl LocalStorage {
    /// Create a LocalStorage keeping `file_name` inside `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> PathBuf {
        self.root_dir.join(&self.file_name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.root_dir.join(format!("{}.tmp", self.file_name))
    }

    /// First free `<file>.corrupt-<stamp>[-n]` path.
    async fn corrupt_path(&self) -> std::io::Result<PathBuf> {
        let base = format!(
            "{}.corrupt-{}",
            self.file_name,
            Utc::now().format("%Y%m%dT%H%M%S")
        );
        let mut target = self.root_dir.join(&base);
        let mut n = 1;
        while tokio::fs::try_exists(&target).await? {
            target = self.root_dir.join(format!("{base}-{n}"));
            n += 1;
        }
        Ok(target)
    }

    /// Make sure the storage directory exists.
    ///
    /// Called once at startup; failure here is the only fatal storage error.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|e| AppError::storage_init(&self.root_dir, e))?;

        let meta = tokio::fs::metadata(&self.root_dir)
            .await
            .map_err(|e| AppError::storage_init(&self.root_dir, e))?;
        if meta.permissions().readonly() {
            return Err(AppError::storage_init(&self.root_dir, "directory is read-only"));
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.tmp_path();
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(re) = tokio::fs::remove_file(&tmp).await {
                if re.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", tmp.display(), re);
                }
            }
            return Err(e);
        }

        #[cfg(unix)]
        if let Some(parent) = path.parent() {
            sync_dir(parent).await;
        }
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> std::io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SeenStore for LocalStorage {
    async fn load(&self) -> Result<SeenSet> {
        let path = self.path();
        let bytes = match self.read_bytes(&path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No state file at {}, starting fresh", path.display());
                return Ok(SeenSet::new());
            }
            // The file may be fine; only unparsable content counts as corrupt.
            Err(e) => return Err(AppError::persistence(&path, e)),
        };

        let state: StateFile =
            serde_json::from_slice(&bytes).map_err(|e| AppError::corrupt_state(&path, e))?;

        let seen = SeenSet::from_records(state.records);
        log::debug!("Loaded {} records from {}", seen.len(), path.display());
        Ok(seen)
    }

    async fn save(&self, seen: &SeenSet) -> Result<()> {
        let path = self.path();
        let bytes = serde_json::to_vec_pretty(&StateFile::new(seen))
            .map_err(|e| AppError::persistence(&path, e))?;

        self.write_bytes(&path, &bytes)
            .await
            .map_err(|e| AppError::persistence(&path, e))?;

        log::debug!("Saved {} records to {}", seen.len(), path.display());
        Ok(())
    }

    async fn quarantine(&self) -> Result<()> {
        let path = self.path();
        if tokio::fs::try_exists(&path).await? {
            let target = self.corrupt_path().await?;
            tokio::fs::rename(&path, &target).await?;
            log::warn!("Moved unreadable state to {}", target.display());
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }
}

/// Persist a rename by syncing the directory holding it.
#[cfg(unix)]
async fn sync_dir(dir: &Path) {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let synced = match tokio::fs::File::open(dir).await {
        Ok(handle) => handle.sync_all().await,
        Err(e) => Err(e),
    };
    if let Err(e) = synced {
        log::debug!("Could not sync directory {}: {}", dir.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candidate;
    use crate::storage::merge;
    use chrono::Utc;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> LocalStorage {
        LocalStorage::new(tmp.path(), "notified.json")
    }

    /// Contents of every quarantined copy in the directory.
    fn quarantined(tmp: &TempDir) -> Vec<String> {
        std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("notified.json.corrupt-"))
            })
            .map(|path| std::fs::read_to_string(path).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let seen = storage(&tmp).load().await.unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        let first = merge(&SeenSet::new(), &[Candidate::new("/c/11", "Ch 11")], Utc::now());
        storage.save(&first).await.unwrap();

        let items = vec![Candidate::new("/c/12", "Ch 12"), Candidate::new("/c/13", "Ch 13")];
        let merged = merge(&storage.load().await.unwrap(), &items, Utc::now());
        storage.save(&merged).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded, merged);
        let ids: Vec<_> = loaded.records().iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["/c/11", "/c/12", "/c/13"]);
        assert!(!storage.tmp_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        std::fs::write(storage.path(), b"{ not json").unwrap();

        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptState { .. }));

        storage.quarantine().await.unwrap();
        assert!(!storage.path().exists());
        assert_eq!(quarantined(&tmp), vec!["{ not json".to_string()]);
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quarantine_keeps_every_copy() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        std::fs::write(storage.path(), b"FIRST").unwrap();
        storage.quarantine().await.unwrap();
        std::fs::write(storage.path(), b"SECOND").unwrap();
        storage.quarantine().await.unwrap();

        let mut copies = quarantined(&tmp);
        copies.sort();
        assert_eq!(copies, vec!["FIRST".to_string(), "SECOND".to_string()]);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_not_corrupt() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        std::fs::create_dir(storage.path()).unwrap();

        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, AppError::Persistence { .. }));
    }

    #[tokio::test]
    async fn test_failed_write_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        // A non-empty directory in the way makes the final rename fail.
        std::fs::create_dir(storage.path()).unwrap();
        std::fs::write(storage.path().join("keep"), b"").unwrap();

        let seen = merge(&SeenSet::new(), &[Candidate::new("/c/1", "One")], Utc::now());
        let err = storage.save(&seen).await.unwrap_err();

        assert!(matches!(err, AppError::Persistence { .. }));
        assert!(!storage.tmp_path().exists());
    }

    #[tokio::test]
    async fn test_file_is_human_readable() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let seen = merge(&SeenSet::new(), &[Candidate::new("/c/1", "One")], Utc::now());
        storage.save(&seen).await.unwrap();

        let text = std::fs::read_to_string(storage.path()).unwrap();
        assert!(text.contains("\"identifier\": \"/c/1\""));
        assert!(text.contains("\"count\": 1"));
    }

    #[tokio::test]
    async fn test_init_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested/state"), "notified.json");

        storage.init().await.unwrap();
        assert!(tmp.path().join("nested/state").is_dir());
    }

    #[tokio::test]
    async fn test_init_fails_under_a_file() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let storage = LocalStorage::new(blocker.join("state"), "notified.json");
        let err = storage.init().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
