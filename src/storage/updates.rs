//! Persisted set of targets flagged as changed.
//!
//! Shared by every check task and by command handlers. All access goes
//! through one async mutex, and the file is rewritten while the lock is held.
//! A membership change only takes effect in memory once it was persisted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::storage::local::write_atomic;

/// One flagged target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub url: String,
    /// When the target was first flagged since the last clear
    pub flagged_at: DateTime<Utc>,
}

/// Update set backed by a JSON file.
#[derive(Debug)]
pub struct UpdateStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, DateTime<Utc>>>,
}

impl UpdateStore {
    /// Load the update set left by the previous run, or start empty.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(AppError::storage(path, e)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flag a target. Returns `true` if it was not flagged before.
    pub async fn flag(&self, url: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(url) {
            return Ok(false);
        }
        let mut next = entries.clone();
        next.insert(url.to_string(), Utc::now());
        self.persist(&next).await?;
        *entries = next;
        Ok(true)
    }

    /// Remove a target. Returns `true` if it was flagged.
    pub async fn unflag(&self, url: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(url) {
            return Ok(false);
        }
        let mut next = entries.clone();
        next.remove(url);
        self.persist(&next).await?;
        *entries = next;
        Ok(true)
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.entries.lock().await.contains_key(url)
    }

    /// Flagged targets, ordered by URL.
    pub async fn list(&self) -> Vec<UpdateEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|(url, flagged_at)| UpdateEntry {
                url: url.clone(),
                flagged_at: *flagged_at,
            })
            .collect()
    }

    /// Remove every entry. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        self.persist(&BTreeMap::new()).await?;
        entries.clear();
        Ok(count)
    }

    async fn persist(&self, entries: &BTreeMap<String, DateTime<Utc>>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| AppError::storage(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_flag_persists_across_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("updates.json");

        let store = UpdateStore::load(&path).await.unwrap();
        assert!(store.flag("http://a/").await.unwrap());
        assert!(!store.flag("http://a/").await.unwrap());
        assert!(store.flag("http://b/").await.unwrap());

        let reloaded = UpdateStore::load(&path).await.unwrap();
        let urls: Vec<_> = reloaded.list().await.into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["http://a/", "http://b/"]);
    }

    #[tokio::test]
    async fn test_unflag_and_clear() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("updates.json");

        let store = UpdateStore::load(&path).await.unwrap();
        store.flag("http://a/").await.unwrap();
        store.flag("http://b/").await.unwrap();

        assert!(store.unflag("http://a/").await.unwrap());
        assert!(!store.unflag("http://a/").await.unwrap());
        assert!(!store.contains("http://a/").await);

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.list().await.is_empty());

        let reloaded = UpdateStore::load(&path).await.unwrap();
        assert!(reloaded.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_flag_keeps_first_timestamp() {
        let tmp = TempDir::new().unwrap();
        let store = UpdateStore::load(tmp.path().join("updates.json"))
            .await
            .unwrap();

        store.flag("http://a/").await.unwrap();
        let first = store.list().await[0].flagged_at;
        store.flag("http://a/").await.unwrap();
        assert_eq!(store.list().await[0].flagged_at, first);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("updates.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            UpdateStore::load(&path).await,
            Err(AppError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_membership_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("updates.json");
        let store = UpdateStore::load(&path).await.unwrap();

        // A directory in place of the file makes every rewrite fail
        std::fs::create_dir(&path).unwrap();
        let err = store.flag("http://a/").await.unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
        assert!(!store.contains("http://a/").await);

        std::fs::remove_dir(&path).unwrap();
        assert!(store.flag("http://a/").await.unwrap());

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(store.unflag("http://a/").await.is_err());
        assert!(store.clear().await.is_err());
        assert!(store.contains("http://a/").await);
    }
}
