//! Storage abstractions for snapshot persistence.
//!
//! Every target owns one file per store, named by its cache key, so targets
//! never contend for the same file.
//!
//! ## Directory Structure
//!
//! ```text
//! {root}/
//! ├── updates.json          # Targets currently flagged as changed
//! ├── cache/<key>.htm       # Baseline snapshots
//! ├── read/<key>.htm        # Snapshot when the target was first observed
//! └── debug/
//!     ├── cache/<key>.htm   # Rendered page of the latest fetch
//!     └── read/<key>.htm    # Rendered page when first observed
//! ```

pub mod local;
pub mod updates;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use updates::{UpdateEntry, UpdateStore};

/// Trait for baseline and debug snapshot backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the baseline of a target, `None` if it was never checked.
    async fn load_baseline(&self, key: &str) -> Result<Option<String>>;

    /// Replace the baseline of a target.
    async fn save_baseline(&self, key: &str, snapshot: &str) -> Result<()>;

    /// Store the full rendered page of the latest fetch.
    ///
    /// Only for troubleshooting; never read back by the checker.
    async fn save_debug(&self, key: &str, document: &str) -> Result<()>;

    /// Store the read copies written when a target is first observed.
    async fn save_read(&self, key: &str, snapshot: &str, document: &str) -> Result<()>;
}
