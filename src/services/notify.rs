//! Notification seam.
//!
//! Delivery itself (mail, chat, ...) lives outside this crate; the checker
//! only hands over the changed page and the recipient.

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// Delivers change notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `snapshot` of the page at `url` to `recipient`.
    async fn notify(&self, url: &Url, recipient: &str, snapshot: &str) -> Result<()>;
}
