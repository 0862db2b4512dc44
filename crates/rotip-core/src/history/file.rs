//! File-backed IP history store
//!
//! ## File format
//!
//! A plain text file with one distinct IP per line, in first-observed
//! order. The format is shared with the operator: it can be inspected,
//! grepped and truncated by hand, so this store never rewrites existing
//! lines, it only appends.
//!
//! ## Durability model
//!
//! Unlike a cached store, every call re-reads the file. The agent process
//! is short-lived compared to the history (phones reboot, sessions come
//! and go), so membership checks must always reflect the on-disk state at
//! call time rather than whatever a previous process believed.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::IpHistoryStore;
use async_trait::async_trait;

/// File-backed history store (one IP per line, append-only)
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    /// Create a store backed by the given path
    ///
    /// The file itself is created lazily on the first `record` call;
    /// constructing the store performs no I/O.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path to the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory and an empty file exist
    async fn ensure_exists(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::history_store(format!(
                        "Failed to create history directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::File::create(&self.path).await.map_err(|e| {
            Error::history_store(format!(
                "Failed to create history file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Read all recorded IPs from disk
    async fn load(&self) -> Result<Vec<String>, Error> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::history_store(format!(
                "Failed to read history file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(content
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect())
    }
}

#[async_trait]
impl IpHistoryStore for FileHistoryStore {
    async fn record(&self, ip: &str) -> Result<bool, Error> {
        self.ensure_exists().await?;

        let known = self.load().await?;
        if known.iter().any(|existing| existing == ip) {
            tracing::debug!(ip, "IP already recorded, skipping");
            return Ok(false);
        }

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::history_store(format!(
                    "Failed to open history file {} for append: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.write_all(format!("{}\n", ip).as_bytes())
            .await
            .map_err(|e| {
                Error::history_store(format!(
                    "Failed to append to history file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        file.flush().await.map_err(|e| {
            Error::history_store(format!(
                "Failed to flush history file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(ip, total = known.len() + 1, "Recorded new IP");
        Ok(true)
    }

    async fn count(&self) -> Result<usize, Error> {
        Ok(self.load().await?.len())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn record_dedup_and_count() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("total_ips.txt"));

        assert_eq!(store.count().await.unwrap(), 0);

        assert!(store.record("3.3.3.3").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        // Second record of the same IP is a no-op
        assert!(!store.record("3.3.3.3").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(store.record("4.4.4.4").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn preserves_first_observed_order() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("total_ips.txt"));

        store.record("1.1.1.1").await.unwrap();
        store.record("2.2.2.2").await.unwrap();
        store.record("1.1.1.1").await.unwrap();
        store.record("3.3.3.3").await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec!["1.1.1.1", "2.2.2.2", "3.3.3.3"]);
    }

    #[tokio::test]
    async fn membership_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("total_ips.txt");

        let store = FileHistoryStore::new(&path);
        store.record("5.5.5.5").await.unwrap();

        // A fresh instance must see the on-disk entry
        let store2 = FileHistoryStore::new(&path);
        assert!(!store2.record("5.5.5.5").await.unwrap());
        assert_eq!(store2.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings").join("total_ips.txt");

        let store = FileHistoryStore::new(&path);
        assert!(store.record("6.6.6.6").await.unwrap());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn external_edits_are_visible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("total_ips.txt");

        let store = FileHistoryStore::new(&path);
        store.record("7.7.7.7").await.unwrap();

        // An operator appending by hand must be reflected immediately
        fs::write(&path, "7.7.7.7\n8.8.8.8\n").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert!(!store.record("8.8.8.8").await.unwrap());
    }
}
