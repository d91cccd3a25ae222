//! Check outcomes and per-cycle reports.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Stage a target's check was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStage {
    /// The check task ended before reporting a stage
    Pending,
    Fetching,
    Extracting,
    Comparing,
}

impl fmt::Display for CheckStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckStage::Pending => "pending",
            CheckStage::Fetching => "fetching",
            CheckStage::Extracting => "extracting",
            CheckStage::Comparing => "comparing",
        };
        f.write_str(name)
    }
}

/// What happened to the notification of a changed target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// No notifier installed or no recipient configured
    Skipped,
    Sent,
    Failed(String),
}

/// Successful result of one check.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckStatus {
    /// No baseline existed; the snapshot became the baseline
    NewlyObserved,
    /// Dissimilarity did not exceed the threshold
    Unchanged { score: f64 },
    /// Dissimilarity exceeded the threshold; baseline replaced
    Changed { score: f64, delivery: Delivery },
}

impl CheckStatus {
    pub fn is_changed(&self) -> bool {
        matches!(self, CheckStatus::Changed { .. })
    }
}

/// A failed check, tagged with the stage it failed in.
#[derive(Debug)]
pub struct CheckFailure {
    pub stage: CheckStage,
    pub error: AppError,
}

impl CheckFailure {
    pub fn new(stage: CheckStage, error: AppError) -> Self {
        Self { stage, error }
    }

    /// Adapter for `map_err` that tags an error with `stage`.
    pub fn at(stage: CheckStage) -> impl Fn(AppError) -> CheckFailure {
        move |error| CheckFailure::new(stage, error)
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed while {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for CheckFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Successful check of one target.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub url: String,
    pub status: CheckStatus,
}

/// Failed check of one target.
#[derive(Debug)]
pub struct TargetFailure {
    pub url: String,
    pub failure: CheckFailure,
}

/// Aggregated result of one fan-out over all targets.
#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<TargetOutcome>,
    pub failures: Vec<TargetFailure>,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            outcomes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }

    /// Status of a target, if its check succeeded.
    pub fn status_of(&self, url: &str) -> Option<&CheckStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.url == url)
            .map(|outcome| &outcome.status)
    }

    /// Failure of a target, if its check failed.
    pub fn failure_of(&self, url: &str) -> Option<&CheckFailure> {
        self.failures
            .iter()
            .find(|failure| failure.url == url)
            .map(|failure| &failure.failure)
    }

    pub fn changed(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_changed())
    }

    /// Log a short summary of the cycle.
    pub fn log_summary(&self) {
        let elapsed = self.finished_at - self.started_at;
        let newly = self
            .outcomes
            .iter()
            .filter(|o| o.status == CheckStatus::NewlyObserved)
            .count();

        log::info!(
            "Checked {} target(s) in {}ms: {} changed, {} new, {} failed",
            self.total(),
            elapsed.num_milliseconds(),
            self.changed().count(),
            newly,
            self.failures.len()
        );
        for failure in &self.failures {
            log::warn!("    {} {}", failure.url, failure.failure);
        }
    }
}
