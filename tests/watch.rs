mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{Harness, Route, TestServer};
use pagewatch::models::{CheckStatus, Target};
use pagewatch::pipeline::{Command, Reply, Watcher};
use tokio::sync::oneshot;

async fn wait_for(path: &std::path::Path) {
    for _ in 0..100 {
        if path.exists() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} was never written", path.display());
}

#[tokio::test]
async fn test_watcher_polls_and_serves_commands() {
    let server = TestServer::start().await;
    server.route("/feed", Route::html("<ul><li>one</li></ul>"));
    let harness = Harness::new(Duration::from_secs(2), None).await;

    let target = Arc::new(Target::new(server.url("/feed")).with_selection("ul"));
    let watcher = Watcher::new(harness.coordinator.clone(), vec![Arc::clone(&target)]);
    let (handle, commands) = Watcher::channel();
    let (stop, stopped) = oneshot::channel::<()>();
    let running = tokio::spawn(watcher.run(commands, async move {
        let _ = stopped.await;
    }));

    // The first poll happens as soon as the watcher starts
    wait_for(&harness.storage.baseline_path(&target.cache_key())).await;

    match handle.send(Command::ListUpdates).await.unwrap() {
        Reply::Updates(entries) => assert!(entries.is_empty()),
        other => panic!("unexpected reply {other:?}"),
    }

    server.route("/feed", Route::html("<ul><li>one</li><li>two</li></ul>"));
    match handle.send(Command::ForceRecheck).await.unwrap() {
        Reply::Rechecked(report) => {
            assert!(matches!(
                report.status_of(target.id()),
                Some(CheckStatus::Changed { .. })
            ));
        }
        other => panic!("unexpected reply {other:?}"),
    }

    match handle.send(Command::ListUpdates).await.unwrap() {
        Reply::Updates(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].url, target.id());
        }
        other => panic!("unexpected reply {other:?}"),
    }

    match handle.send(Command::ClearUpdates).await.unwrap() {
        Reply::Cleared(count) => assert_eq!(count, 1),
        other => panic!("unexpected reply {other:?}"),
    }
    assert!(harness.updates.list().await.is_empty());

    stop.send(()).unwrap();
    running.await.unwrap().unwrap();
    assert!(handle.send(Command::ListUpdates).await.is_err());
}

#[tokio::test]
async fn test_update_set_survives_restart() {
    let server = TestServer::start().await;
    server.route("/page", Route::html("<p>first</p>"));
    let harness = Harness::new(Duration::from_secs(2), None).await;

    let target = Arc::new(Target::new(server.url("/page")).with_selection("p"));
    let targets = vec![Arc::clone(&target)];
    harness.coordinator.run_cycle(&targets).await;
    server.route("/page", Route::html("<p>second version</p>"));
    harness.coordinator.run_cycle(&targets).await;

    let reloaded = pagewatch::storage::UpdateStore::load(harness.updates.path())
        .await
        .unwrap();
    let entries = reloaded.list().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url, target.id());
}

#[tokio::test]
async fn test_shutdown_does_not_wait_for_forced_recheck() {
    let server = TestServer::start().await;
    server.route(
        "/slow",
        Route::html("<p>slow</p>").with_delay(Duration::from_secs(5)),
    );
    let harness = Harness::new(Duration::from_secs(2), None).await;

    let target = Arc::new(Target::new(server.url("/slow")).with_selection("p"));
    let watcher = Watcher::new(harness.coordinator.clone(), vec![target]);
    let (handle, commands) = Watcher::channel();
    let (stop, stopped) = oneshot::channel::<()>();
    let running = tokio::spawn(watcher.run(commands, async move {
        let _ = stopped.await;
    }));

    let pending = tokio::spawn(async move { handle.send(Command::ForceRecheck).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    stop.send(()).unwrap();
    running.await.unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    // The unfinished recheck is dropped along with its reply
    assert!(pending.await.unwrap().is_err());
}
