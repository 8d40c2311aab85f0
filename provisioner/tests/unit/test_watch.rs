//! Watch loop tests on a paused clock

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio_util::sync::CancellationToken;

use devprov::watch::controller::{ProgressOptions, ProgressWatcher};
use devprov::watch::session::{WatchPhase, WatchSession};
use devprov::watch::source::DeploymentState;
use devprov::workers::{environment, progress};

use crate::fakes::{creating, handle, ready, transient, FakeReporters, FakeStatusSource};

fn session(scope: &CancellationToken) -> Arc<WatchSession> {
    Arc::new(WatchSession::starting_at("feature-1", scope.clone(), Utc::now()))
}

fn watcher(source: &Arc<FakeStatusSource>, reporters: &Arc<FakeReporters>, options: ProgressOptions) -> ProgressWatcher {
    ProgressWatcher::new(source.clone(), reporters.clone(), options)
}

#[tokio::test(start_paused = true)]
async fn test_scenario_hand_off_after_resource_group_and_deployment() {
    let scope = CancellationToken::new();
    let session = session(&scope);
    let since = session.started_at();

    let source = Arc::new(FakeStatusSource::new());
    source.push_snapshot(creating());
    source.push_snapshot(creating());
    source.push_snapshot(ready("rg1"));
    source.push_search(Ok(vec![]));
    source.push_search(Ok(vec![handle("old", DeploymentState::Running, since)]));
    source.push_search(Ok(vec![handle(
        "fresh",
        DeploymentState::Running,
        since + ChronoDuration::seconds(20),
    )]));

    let reporters = Arc::new(FakeReporters::default());
    let task = watcher(&source, &reporters, ProgressOptions::default()).spawn(session.clone());
    task.await.unwrap();

    assert_eq!(source.snapshot_calls(), 3);
    assert_eq!(source.search_calls(), 3);
    assert_eq!(source.searched_groups(), vec!["rg1", "rg1", "rg1"]);
    assert_eq!(session.phase(), WatchPhase::ReportingProgress);

    // let the progress task start
    tokio::time::sleep(Duration::from_secs(1)).await;
    let created = reporters.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "fresh");

    scope.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_no_search_before_resource_group_exists() {
    let scope = CancellationToken::new();
    let session = session(&scope);

    let source = Arc::new(FakeStatusSource::new());
    for _ in 0..5 {
        source.push_snapshot(creating());
    }
    source.push_snapshot(ready(""));
    source.push_snapshot(Ok(None));

    let task = {
        let session = session.clone();
        let source = source.clone();
        tokio::spawn(async move {
            environment::run(
                &environment::Options::default(),
                &session,
                source.as_ref(),
                tokio::time::sleep,
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_secs(60)).await;
    scope.cancel();

    assert!(task.await.unwrap().is_none());
    assert!(source.snapshot_calls() >= 7);
    assert_eq!(source.search_calls(), 0);
    assert_eq!(session.phase(), WatchPhase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_environment_loop_survives_query_failures() {
    let scope = CancellationToken::new();
    let session = session(&scope);
    let since = session.started_at();

    let source = Arc::new(FakeStatusSource::new());
    source.push_snapshot(Err(transient()));
    source.push_snapshot(ready("rg1"));
    source.push_search(Err(transient()));
    source.push_search(Ok(vec![handle(
        "fresh",
        DeploymentState::Running,
        since + ChronoDuration::seconds(1),
    )]));

    let found = environment::run(
        &environment::Options::default(),
        &session,
        source.as_ref(),
        tokio::time::sleep,
    )
    .await;

    assert_eq!(found.map(|d| d.name), Some("fresh".to_string()));
    assert_eq!(source.snapshot_calls(), 2);
    assert_eq!(source.search_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_environment_loop_rejects_finished_and_older_deployments() {
    let scope = CancellationToken::new();
    let session = session(&scope);
    let since = session.started_at();

    let source = Arc::new(FakeStatusSource::new());
    source.push_snapshot(ready("rg1"));
    source.push_search(Ok(vec![
        handle("earlier", DeploymentState::Running, since - ChronoDuration::seconds(5)),
        handle("done", DeploymentState::Succeeded, since + ChronoDuration::seconds(5)),
    ]));

    let task = {
        let session = session.clone();
        let source = source.clone();
        tokio::spawn(async move {
            environment::run(
                &environment::Options::default(),
                &session,
                source.as_ref(),
                tokio::time::sleep,
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_secs(30)).await;
    scope.cancel();

    assert!(task.await.unwrap().is_none());
    assert!(source.search_calls() > 1);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_makes_no_remote_calls() {
    let scope = CancellationToken::new();
    let session = session(&scope);

    let source = Arc::new(FakeStatusSource::new());
    source.push_snapshot(ready("rg1"));
    let reporters = Arc::new(FakeReporters::default());

    let options = ProgressOptions::default().with_disabled(true);
    watcher(&source, &reporters, options.clone())
        .spawn(session.clone())
        .await
        .unwrap();

    progress::run(
        &options.progress,
        &session,
        &handle("d1", DeploymentState::Running, Utc::now()),
        reporters.as_ref(),
        tokio::time::sleep,
    )
    .await;

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.snapshot_calls(), 0);
    assert_eq!(source.search_calls(), 0);
    assert!(reporters.created().is_empty());
    assert_eq!(reporters.reporter.calls(), 0);
    assert_eq!(session.phase(), WatchPhase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_progress_ticks_reports_once() {
    let scope = CancellationToken::new();
    let session = session(&scope);
    let reporters = Arc::new(FakeReporters::default());

    let task = {
        let session = session.clone();
        let reporters = reporters.clone();
        tokio::spawn(async move {
            let deployment = handle("d1", DeploymentState::Running, Utc::now());
            progress::run(
                &progress::Options::default(),
                &session,
                &deployment,
                reporters.as_ref(),
                tokio::time::sleep,
            )
            .await
        })
    };

    // first report at 3s, second would be at 13s
    tokio::time::sleep(Duration::from_secs(5)).await;
    scope.cancel();
    task.await.unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(reporters.reporter.calls(), 1);
    assert_eq!(session.phase(), WatchPhase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_progress_loop_survives_report_failures() {
    let scope = CancellationToken::new();
    let session = session(&scope);
    let reporters = Arc::new(FakeReporters::default());
    reporters.reporter.push_result(Err(transient()));
    reporters.reporter.push_result(Err(transient()));

    let task = {
        let session = session.clone();
        let reporters = reporters.clone();
        tokio::spawn(async move {
            let deployment = handle("d1", DeploymentState::Running, Utc::now());
            progress::run(
                &progress::Options::default(),
                &session,
                &deployment,
                reporters.as_ref(),
                tokio::time::sleep,
            )
            .await
        })
    };

    // reports at 3s, 13s, 23s and 33s
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert!(!task.is_finished());
    assert_eq!(reporters.reporter.calls(), 4);

    scope.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_progress_cursor_never_moves_backward() {
    let scope = CancellationToken::new();
    let session = session(&scope);
    let reporters = Arc::new(FakeReporters::default());
    reporters.reporter.push_result(Ok(30));
    reporters.reporter.push_result(Ok(-120));
    reporters.reporter.push_result(Err(transient()));
    reporters.reporter.push_result(Ok(0));
    reporters.reporter.push_result(Ok(5));

    let task = {
        let session = session.clone();
        let reporters = reporters.clone();
        tokio::spawn(async move {
            let deployment = handle("d1", DeploymentState::Running, Utc::now());
            progress::run(
                &progress::Options::default(),
                &session,
                &deployment,
                reporters.as_ref(),
                tokio::time::sleep,
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_secs(60)).await;
    scope.cancel();
    task.await.unwrap();

    let cursors = reporters.reporter.cursors();
    assert!(cursors.len() >= 6);
    assert!(cursors.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(cursors[1].at() - cursors[0].at(), ChronoDuration::seconds(30));
    assert_eq!(cursors[2], cursors[1]);
    assert_eq!(cursors[5].at() - cursors[4].at(), ChronoDuration::seconds(5));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_freezes_remote_calls() {
    let scope = CancellationToken::new();
    let session = session(&scope);
    let since = session.started_at();

    let source = Arc::new(FakeStatusSource::new());
    source.push_snapshot(ready("rg1"));
    source.push_search(Ok(vec![handle(
        "fresh",
        DeploymentState::Running,
        since + ChronoDuration::seconds(1),
    )]));
    let reporters = Arc::new(FakeReporters::default());

    watcher(&source, &reporters, ProgressOptions::default())
        .spawn(session.clone())
        .await
        .unwrap();

    // progress reports at 6s, 16s, 26s
    tokio::time::sleep(Duration::from_secs(27)).await;
    scope.cancel();
    let reports = reporters.reporter.calls();
    assert_eq!(reports, 3);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(reporters.reporter.calls(), reports);
    assert_eq!(source.snapshot_calls(), 1);
    assert_eq!(source.search_calls(), 1);
    assert_eq!(reporters.created().len(), 1);
    assert_eq!(session.phase(), WatchPhase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_start_is_scoped_to_parent_token() {
    let parent = CancellationToken::new();
    let source = Arc::new(FakeStatusSource::new());
    let reporters = Arc::new(FakeReporters::default());

    watcher(&source, &reporters, ProgressOptions::default()).start("feature-1", &parent);

    // polls at 3s, 8s, 13s
    tokio::time::sleep(Duration::from_secs(14)).await;
    assert_eq!(source.snapshot_calls(), 3);

    parent.cancel();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.snapshot_calls(), 3);
}
