//! Local filesystem storage implementation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::SnapshotStore;

const EXTENSION: &str = "htm";

const CACHE_DIR: &str = "cache";
const READ_DIR: &str = "read";
const DEBUG_CACHE_DIR: &str = "debug/cache";
const DEBUG_READ_DIR: &str = "debug/read";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Create every store directory up front.
    pub async fn init(&self) -> Result<()> {
        for dir in [CACHE_DIR, READ_DIR, DEBUG_CACHE_DIR, DEBUG_READ_DIR] {
            let path = self.root_dir.join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| AppError::storage(&path, e))?;
        }
        Ok(())
    }

    /// Full path of a key inside one of the stores.
    fn path(&self, dir: &str, key: &str) -> PathBuf {
        self.root_dir.join(dir).join(format!("{key}.{EXTENSION}"))
    }

    pub fn baseline_path(&self, key: &str) -> PathBuf {
        self.path(CACHE_DIR, key)
    }

    pub fn debug_path(&self, key: &str) -> PathBuf {
        self.path(DEBUG_CACHE_DIR, key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        write_atomic(path, bytes)
            .await
            .map_err(|e| AppError::storage(path, e))
    }

    /// Read text, returning None if the file doesn't exist.
    async fn read_string(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(path, e)),
        }
    }
}

/// Distinguishes temp files of concurrent writes within this process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write to a uniquely named sibling temp file, then rename over `path`.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_path(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load_baseline(&self, key: &str) -> Result<Option<String>> {
        self.read_string(&self.baseline_path(key)).await
    }

    async fn save_baseline(&self, key: &str, snapshot: &str) -> Result<()> {
        self.write_bytes(&self.baseline_path(key), snapshot.as_bytes())
            .await
    }

    async fn save_debug(&self, key: &str, document: &str) -> Result<()> {
        self.write_bytes(&self.debug_path(key), document.as_bytes())
            .await
    }

    async fn save_read(&self, key: &str, snapshot: &str, document: &str) -> Result<()> {
        self.write_bytes(&self.path(READ_DIR, key), snapshot.as_bytes())
            .await?;
        self.write_bytes(&self.path(DEBUG_READ_DIR, key), document.as_bytes())
            .await
    }
}
