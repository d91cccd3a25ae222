// src/services/checker.rs

//! Per-target check pipeline.
//!
//! Fetch → select → transform → filter → compare → persist, strictly in that
//! order for one target. Every error is tagged with the stage it came from.

use std::collections::HashMap;
use std::sync::Arc;

use scraper::Html;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, Result};
use crate::models::{CheckFailure, CheckStage, CheckStatus, Delivery, Document, Target};
use crate::pipeline::diff::{dissimilarity, exceeds};
use crate::services::{Fetcher, Filter, Notifier, StructuralQuery, TransformPipeline};
use crate::storage::{SnapshotStore, UpdateStore};

/// A fetched page reduced for comparison.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Selection after transforms and filters
    pub snapshot: String,
    /// Whole page rendered before selection
    pub document: String,
    selection: Document,
    filter: Filter,
}

impl Extraction {
    /// Reduce page markup according to a target's settings.
    pub fn from_markup(target: &Target, markup: &str) -> Result<Self> {
        let query = StructuralQuery::compile(&target.selection)?;
        let filter = Filter::new(target.include.as_deref(), target.exclude.as_deref())?;

        let html = Html::parse_document(markup);
        let document = Document::from_html(&html).render();
        let selection = query.select(&html);

        let reduced = TransformPipeline::new(&target.transforms)
            .run(selection.clone())
            .render();
        let snapshot = filter.apply(&reduced);

        Ok(Self {
            snapshot,
            document,
            selection,
            filter,
        })
    }

    /// Text sent with a change notification: the selection without
    /// transforms or inclusion pattern, with exclusions still removed.
    pub fn notification_text(&self) -> String {
        self.filter
            .exclusion_only()
            .apply(&self.selection.render())
    }
}

/// Runs the check pipeline for single targets.
///
/// Checks of the same target never overlap; a second check waits for the
/// first and then compares against the baseline it left.
pub struct PageChecker {
    fetcher: Fetcher,
    store: Arc<dyn SnapshotStore>,
    updates: Arc<UpdateStore>,
    notifier: Option<Arc<dyn Notifier>>,
    in_progress: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PageChecker {
    pub fn new(fetcher: Fetcher, store: Arc<dyn SnapshotStore>, updates: Arc<UpdateStore>) -> Self {
        Self {
            fetcher,
            store,
            updates,
            notifier: None,
            in_progress: Mutex::new(HashMap::new()),
        }
    }

    /// Install the collaborator that delivers change notifications.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn updates(&self) -> &Arc<UpdateStore> {
        &self.updates
    }

    /// Check one target against its baseline.
    pub async fn check(&self, target: &Target) -> std::result::Result<CheckStatus, CheckFailure> {
        let _guard = self.lock_target(target).await;

        log::debug!("[/] Downloading: {}", target.url);
        let markup = self
            .fetcher
            .fetch(target)
            .await
            .map_err(CheckFailure::at(CheckStage::Fetching))?;

        let key = target.cache_key();
        let extraction = Extraction::from_markup(target, &markup)
            .map_err(CheckFailure::at(CheckStage::Extracting))?;

        self.store
            .save_debug(&key, &extraction.document)
            .await
            .map_err(CheckFailure::at(CheckStage::Extracting))?;

        if extraction.snapshot.is_empty() {
            return Err(CheckFailure::new(
                CheckStage::Extracting,
                AppError::EmptySelection {
                    url: target.url.to_string(),
                },
            ));
        }

        self.compare(target, &key, &extraction)
            .await
            .map_err(CheckFailure::at(CheckStage::Comparing))
    }

    async fn lock_target(&self, target: &Target) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.in_progress.lock().await;
            Arc::clone(locks.entry(target.id().to_string()).or_default())
        };
        lock.lock_owned().await
    }

    async fn compare(
        &self,
        target: &Target,
        key: &str,
        extraction: &Extraction,
    ) -> Result<CheckStatus> {
        let Some(baseline) = self.store.load_baseline(key).await? else {
            self.store.save_baseline(key, &extraction.snapshot).await?;
            self.store
                .save_read(key, &extraction.snapshot, &extraction.document)
                .await?;
            log::info!("[+] New site added: {}", target.url);
            return Ok(CheckStatus::NewlyObserved);
        };

        let score = dissimilarity(&baseline, &extraction.snapshot);
        if !exceeds(score, target.threshold) {
            log::debug!("[-] No update: {} ({:.2}%)", target.url, score);
            return Ok(CheckStatus::Unchanged { score });
        }

        // The baseline moves last: if flagging fails the change is seen again
        log::info!("[!] Updated: {} ({:.2}%)", target.url, score);
        self.updates.flag(target.id()).await?;
        let delivery = self.dispatch(target, extraction).await?;
        self.store.save_baseline(key, &extraction.snapshot).await?;

        Ok(CheckStatus::Changed { score, delivery })
    }

    /// Hand the change to the notifier. The target stays flagged unless
    /// delivery succeeds.
    async fn dispatch(&self, target: &Target, extraction: &Extraction) -> Result<Delivery> {
        let (Some(notifier), Some(recipient)) = (&self.notifier, &target.recv_mail) else {
            return Ok(Delivery::Skipped);
        };

        match notifier
            .notify(&target.url, recipient, &extraction.notification_text())
            .await
        {
            Ok(()) => {
                self.updates.unflag(target.id()).await?;
                log::info!("Notified {} about {}", recipient, target.url);
                Ok(Delivery::Sent)
            }
            Err(e) => {
                log::error!("Failed to notify {} about {}: {}", recipient, target.url, e);
                Ok(Delivery::Failed(e.to_string()))
            }
        }
    }
}
