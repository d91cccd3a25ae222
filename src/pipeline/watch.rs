// src/pipeline/watch.rs

//! Long-running watch mode.
//!
//! Every target is polled on its own interval in its own task. Commands
//! arrive over a channel; forced rechecks run in the background while the
//! other commands are answered in place.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::error::{AppError, Result};
use crate::models::{CheckStatus, CycleReport, Target};
use crate::pipeline::Coordinator;
use crate::storage::{UpdateEntry, UpdateStore};

const COMMAND_BUFFER: usize = 16;

/// Commands accepted by a running watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Check every target now, outside the regular schedule
    ForceRecheck,
    /// List targets flagged as changed
    ListUpdates,
    /// Forget every flagged target
    ClearUpdates,
}

/// Answer to a [`Command`].
#[derive(Debug)]
pub enum Reply {
    Rechecked(CycleReport),
    Updates(Vec<UpdateEntry>),
    Cleared(usize),
}

/// A command waiting for its reply.
#[derive(Debug)]
pub struct Request {
    command: Command,
    reply: oneshot::Sender<Result<Reply>>,
}

/// Sends commands to a running [`Watcher`].
#[derive(Debug, Clone)]
pub struct WatcherHandle {
    tx: mpsc::Sender<Request>,
}

impl WatcherHandle {
    pub async fn send(&self, command: Command) -> Result<Reply> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| AppError::task("watcher", "not running"))?;
        response
            .await
            .map_err(|_| AppError::task("watcher", "stopped before replying"))?
    }
}

pub struct Watcher {
    coordinator: Coordinator,
    targets: Vec<Arc<Target>>,
    updates: Arc<UpdateStore>,
}

impl Watcher {
    pub fn new(coordinator: Coordinator, targets: Vec<Arc<Target>>) -> Self {
        let updates = Arc::clone(coordinator.checker().updates());
        Self {
            coordinator,
            targets,
            updates,
        }
    }

    /// Channel pair connecting a [`WatcherHandle`] to [`Watcher::run`].
    pub fn channel() -> (WatcherHandle, mpsc::Receiver<Request>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        (WatcherHandle { tx }, rx)
    }

    pub async fn handle(&self, command: Command) -> Result<Reply> {
        match command {
            Command::ForceRecheck => recheck(&self.coordinator, &self.targets).await,
            Command::ListUpdates => Ok(Reply::Updates(self.updates.list().await)),
            Command::ClearUpdates => {
                let cleared = self.updates.clear().await?;
                log::info!("Cleared {} update(s)", cleared);
                Ok(Reply::Cleared(cleared))
            }
        }
    }

    /// Poll all targets and serve commands until `shutdown` resolves.
    ///
    /// Forced rechecks run in their own task, so shutdown never waits for a
    /// cycle to finish. Pollers and unfinished rechecks are aborted on exit.
    pub async fn run(
        self,
        mut commands: mpsc::Receiver<Request>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        log::info!("Watching {} target(s)", self.targets.len());

        let mut tasks = JoinSet::new();
        for target in &self.targets {
            tasks.spawn(poll(self.coordinator.clone(), Arc::clone(target)));
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(Request { command, reply }) = commands.recv() => match command {
                    Command::ForceRecheck => {
                        let coordinator = self.coordinator.clone();
                        let targets = self.targets.clone();
                        tasks.spawn(async move {
                            let result = recheck(&coordinator, &targets).await;
                            if reply.send(result).is_err() {
                                log::debug!("Reply to {:?} dropped by caller", command);
                            }
                        });
                    }
                    _ => {
                        let result = self.handle(command).await;
                        if reply.send(result).is_err() {
                            log::debug!("Reply to {:?} dropped by caller", command);
                        }
                    }
                },
                Some(joined) = tasks.join_next() => {
                    if let Err(e) = joined {
                        log::error!("Watcher task failed: {}", e);
                    }
                }
            }
        }

        log::info!("Shutting down watcher");
        tasks.shutdown().await;
        Ok(())
    }
}

/// Run one full cycle outside the regular schedule.
async fn recheck(coordinator: &Coordinator, targets: &[Arc<Target>]) -> Result<Reply> {
    log::info!("Forced recheck of all targets");
    let report = coordinator.run_cycle(targets).await;
    report.log_summary();
    Ok(Reply::Rechecked(report))
}

/// Check one target forever on its interval. The first check runs at once.
async fn poll(coordinator: Coordinator, target: Arc<Target>) {
    let mut ticker = tokio::time::interval(target.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Ok(CheckStatus::Changed { score, .. }) = coordinator.check_one(&target).await {
            log::debug!("{} flagged ({:.2}%)", target.url, score);
        }
    }
}
