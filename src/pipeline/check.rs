// src/pipeline/check.rs

//! Check cycle over all targets.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;

use crate::error::AppError;
use crate::models::{
    CheckFailure, CheckStage, CheckStatus, CycleReport, Target, TargetFailure, TargetOutcome,
};
use crate::services::PageChecker;

/// Fans checks out over targets, one task per target.
#[derive(Clone)]
pub struct Coordinator {
    checker: Arc<PageChecker>,
}

impl Coordinator {
    pub fn new(checker: PageChecker) -> Self {
        Self {
            checker: Arc::new(checker),
        }
    }

    pub fn checker(&self) -> &PageChecker {
        &self.checker
    }

    /// Check a single target and log the result.
    pub async fn check_one(&self, target: &Target) -> Result<CheckStatus, CheckFailure> {
        let result = self.checker.check(target).await;
        if let Err(failure) = &result {
            log_failure(target.id(), failure);
        }
        result
    }

    /// Check every target concurrently. Returns once all checks finished;
    /// one target failing never affects the others.
    pub async fn run_cycle(&self, targets: &[Arc<Target>]) -> CycleReport {
        let mut report = CycleReport::new(Utc::now());
        log::info!("Checking {} target(s)", targets.len());

        let tasks = targets.iter().map(|target| {
            let coordinator = self.clone();
            let target = Arc::clone(target);
            tokio::spawn(async move { coordinator.check_one(&target).await })
        });
        let results = join_all(tasks).await;

        for (target, joined) in targets.iter().zip(results) {
            let url = target.id().to_string();
            match joined {
                Ok(Ok(status)) => report.outcomes.push(TargetOutcome { url, status }),
                Ok(Err(failure)) => report.failures.push(TargetFailure { url, failure }),
                Err(join_error) => {
                    let failure =
                        CheckFailure::new(CheckStage::Pending, AppError::task(&url, join_error));
                    log_failure(&url, &failure);
                    report.failures.push(TargetFailure { url, failure });
                }
            }
        }

        report.finished_at = Utc::now();
        report
    }
}

/// Configuration problems are errors; network trouble is expected now and then.
fn log_failure(url: &str, failure: &CheckFailure) {
    if failure.error.is_configuration_error() {
        log::error!("[x] {} {}", url, failure);
    } else {
        log::warn!("[x] {} {}", url, failure);
    }
}
