//! Refresh controller and scheduler behaviour against a fake data source.
//!
//! Scheduler tests run on paused tokio time, so timers fire instantly while
//! the snapshot cache (wall clock) stays fresh.
//!
//! Run with: cargo test --test controller_test

mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use common::{test_config, votes, FakeConnector, FakeSource, Harness};
use vote_board::common::AppState;
use vote_board::config::{Config, RefreshMode};
use vote_board::error::AppError;
use vote_board::refresh::scheduler::run_refresh_cycle;
use vote_board::refresh::{RefreshState, WaitMode};
use vote_board::sheets::TabularSnapshot;

fn harness() -> Harness {
    Harness::new(test_config(), FakeSource::with_snapshot(votes(&[("A", 10), ("B", 20)])))
}

#[tokio::test]
async fn acquire_returns_the_same_handle() {
    let h = harness();
    let controller = &h.state.controller;

    let first = controller.acquire_connection().await.unwrap();
    let second = controller.acquire_connection().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(h.connects(), 1);
    assert!(controller.is_connected());
}

#[tokio::test]
async fn failed_acquire_stores_nothing_and_is_retried() {
    let source = FakeSource::with_snapshot(votes(&[("A", 1)]));
    let (connector, connects) = FakeConnector::failing_first(source, 1);
    let state = AppState::new(test_config(), Box::new(connector));

    let err = state.controller.acquire_connection().await.err().unwrap();
    assert!(matches!(err, AppError::Authentication(_)));
    assert!(!state.controller.is_connected());

    assert!(state.controller.acquire_connection().await.is_ok());
    assert_eq!(connects.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn render_pass_publishes_the_view() {
    let h = harness();
    let settings = h.state.current_settings();

    let view = h.state.controller.render_pass(&settings).await.unwrap();

    assert_eq!(view.chart.bars.len(), 2);
    assert_eq!(view.columns, ["Candidates", "Votes"]);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.worksheet_name, "Sheet1");
    assert!(!view.from_cache);
    assert_eq!(view.last_updated_display.len(), "2024-01-01 12:00:00".len());

    let status = h.state.controller.status().await;
    assert_eq!(status.state, RefreshState::Rendered);
    assert_eq!(status.passes, 1);
    assert!(status.error.is_none());
    assert!(status.connected);
}

#[tokio::test]
async fn repeated_passes_within_ttl_read_once() {
    let h = harness();
    let settings = h.state.current_settings();

    h.state.controller.render_pass(&settings).await.unwrap();
    let second = h.state.controller.render_pass(&settings).await.unwrap();

    assert!(second.from_cache);
    assert_eq!(h.source.reads(), 1);
}

#[tokio::test]
async fn header_only_sheet_is_empty_data_not_schema() {
    let h = Harness::new(test_config(), FakeSource::with_snapshot(votes(&[])));
    let settings = h.state.current_settings();

    let err = h.state.controller.render_pass(&settings).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyData));
    assert_eq!(err.to_string(), "No data available");

    let status = h.state.controller.status().await;
    assert_eq!(status.state, RefreshState::Failed);
    assert_eq!(status.error.unwrap().kind, "empty_data");
}

#[tokio::test]
async fn blank_sheet_is_empty_data() {
    let h = Harness::new(
        test_config(),
        FakeSource::with_snapshot(TabularSnapshot::default()),
    );
    let settings = h.state.current_settings();

    assert!(matches!(
        h.state.controller.render_pass(&settings).await,
        Err(AppError::EmptyData)
    ));
}

#[tokio::test]
async fn schema_failure_then_recovery_clears_the_error() {
    let bad = TabularSnapshot::from_values(vec![
        vec!["Name".into(), "Votes".into()],
        vec!["A".into(), 1.into()],
    ])
    .unwrap();
    let h = Harness::new(test_config(), FakeSource::with_snapshot(bad));
    let settings = h.state.current_settings();

    let err = h.state.controller.render_pass(&settings).await.unwrap_err();
    assert!(matches!(err, AppError::Schema(_)));
    assert_eq!(h.state.controller.status().await.error.unwrap().kind, "schema");

    h.source.set_response(Ok(votes(&[("A", 1)])));
    h.state.controller.manual_refresh(&settings).await.unwrap();

    let status = h.state.controller.status().await;
    assert_eq!(status.state, RefreshState::Rendered);
    assert!(status.error.is_none());
    assert_eq!(status.passes, 2);
}

#[tokio::test]
async fn authentication_failure_is_reported_and_retried_next_pass() {
    let source = FakeSource::with_snapshot(votes(&[("A", 1)]));
    let (connector, _) = FakeConnector::failing_first(Arc::clone(&source), 1);
    let state = AppState::new(test_config(), Box::new(connector));
    let settings = state.current_settings();

    let err = state.controller.render_pass(&settings).await.unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
    assert_eq!(source.reads(), 0);

    assert!(state.controller.render_pass(&settings).await.is_ok());
    assert_eq!(source.reads(), 1);
}

#[tokio::test]
async fn manual_refresh_bypasses_a_fresh_cache() {
    let h = harness();
    let settings = h.state.current_settings();

    h.state.controller.render_pass(&settings).await.unwrap();
    h.source.set_response(Ok(votes(&[("A", 15), ("B", 20)])));
    let view = h.state.controller.manual_refresh(&settings).await.unwrap();

    assert!(!view.from_cache);
    assert_eq!(view.chart.bars[0].value, 15.0);
    assert_eq!(h.source.reads(), 2);
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_during_a_running_pass_still_reads() {
    let h = harness();
    h.source.set_read_delay(Duration::from_millis(300));
    let settings = h.state.current_settings();

    let controller = Arc::clone(&h.state.controller);
    let pass_settings = settings.clone();
    let running = tokio::spawn(async move { controller.render_pass(&pass_settings).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let view = h.state.controller.manual_refresh(&settings).await.unwrap();

    assert!(!view.from_cache);
    assert_eq!(h.source.reads(), 2);
    assert!(running.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn forced_refresh_during_a_running_pass_still_reads() {
    let h = harness();
    h.source.set_read_delay(Duration::from_millis(300));
    let settings = h.state.current_settings();

    let controller = Arc::clone(&h.state.controller);
    let pass_settings = settings.clone();
    let running = tokio::spawn(async move { controller.render_pass(&pass_settings).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let view = h.state.controller.forced_refresh(&settings).await.unwrap();

    assert!(!view.from_cache);
    assert_eq!(h.source.reads(), 2);
    assert!(running.await.unwrap().is_ok());
}

#[tokio::test]
async fn forced_refresh_rereads_the_current_sheet() {
    let h = harness();
    let settings = h.state.current_settings();

    h.state.controller.render_pass(&settings).await.unwrap();
    let view = h.state.controller.forced_refresh(&settings).await.unwrap();

    assert!(!view.from_cache);
    assert_eq!(h.source.reads(), 2);
}

#[tokio::test]
async fn only_a_rendered_cycle_can_be_armed() {
    let h = harness();
    let controller = &h.state.controller;
    let wait = WaitMode::TimedInterval { seconds: 5 };

    assert!(!controller.arm(wait).await);

    controller.render_pass(&h.state.current_settings()).await.unwrap();
    assert!(controller.arm(wait).await);
    assert_eq!(controller.state().await, RefreshState::Waiting { wait });

    h.source.set_response(Err(AppError::SourceUnavailable("HTTP 503".to_string())));
    controller.manual_refresh(&h.state.current_settings()).await.unwrap_err();
    assert!(!controller.arm(wait).await);
    assert_eq!(controller.state().await, RefreshState::Failed);
}

fn auto_refresh_config(interval_secs: u64) -> Config {
    Config {
        default_auto_refresh: true,
        default_refresh_interval_seconds: interval_secs,
        ..test_config()
    }
}

struct Running {
    harness: Harness,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

fn start(harness: Harness) -> Running {
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_refresh_cycle(harness.state.clone(), shutdown_rx));
    Running {
        harness,
        shutdown,
        task,
    }
}

async fn passes(h: &Harness) -> u64 {
    h.state.controller.status().await.passes
}

#[tokio::test(start_paused = true)]
async fn manual_mode_renders_once_and_waits() {
    let run = start(harness());

    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(passes(&run.harness).await, 1);
    assert_eq!(
        run.harness.state.controller.state().await,
        RefreshState::Waiting { wait: WaitMode::Manual }
    );
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_reruns_on_interval_through_the_cache() {
    let source = FakeSource::with_snapshot(votes(&[("A", 10)]));
    let run = start(Harness::new(auto_refresh_config(5), source));

    tokio::time::sleep(Duration::from_secs(16)).await;

    // startup + 5s + 10s + 15s
    assert_eq!(passes(&run.harness).await, 4);
    assert_eq!(run.harness.source.reads(), 1);
}

#[tokio::test(start_paused = true)]
async fn fixed_mode_forces_a_read_every_delay() {
    let config = Config {
        refresh_mode: RefreshMode::Fixed,
        fixed_refresh_delay_seconds: 30,
        cache_ttl_seconds: 3600,
        ..test_config()
    };
    let run = start(Harness::new(
        config,
        FakeSource::with_snapshot(votes(&[("A", 10)])),
    ));

    tokio::time::sleep(Duration::from_secs(95)).await;

    assert_eq!(passes(&run.harness).await, 4);
    assert_eq!(run.harness.source.reads(), 4);
    assert_eq!(
        run.harness.state.controller.state().await,
        RefreshState::Waiting {
            wait: WaitMode::FixedLongDelay { seconds: 30 }
        }
    );
}

#[tokio::test(start_paused = true)]
async fn failure_halts_the_timer_until_manual_refresh() {
    let source = FakeSource::failing(AppError::SourceUnavailable("HTTP 503".to_string()));
    let run = start(Harness::new(auto_refresh_config(1), source));
    let h = &run.harness;

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(passes(h).await, 1);
    assert_eq!(h.state.controller.state().await, RefreshState::Failed);

    h.source.set_response(Ok(votes(&[("A", 1)])));
    h.state
        .controller
        .manual_refresh(&h.state.current_settings())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    // failed pass + manual pass + three ticks
    assert_eq!(passes(h).await, 5);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_up_to_the_limit() {
    let config = Config {
        refresh_retry_max: 2,
        refresh_retry_delay_seconds: 5,
        ..auto_refresh_config(1)
    };
    let source = FakeSource::failing(AppError::SourceUnavailable("HTTP 503".to_string()));
    let run = start(Harness::new(config, source));

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(passes(&run.harness).await, 3);
    assert_eq!(run.harness.source.reads(), 3);
}

#[tokio::test(start_paused = true)]
async fn permanent_failures_are_not_retried() {
    let config = Config {
        refresh_retry_max: 3,
        ..auto_refresh_config(1)
    };
    let source = FakeSource::failing(AppError::NotFound("Unable to parse range".to_string()));
    let run = start(Harness::new(config, source));

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(passes(&run.harness).await, 1);
}

#[tokio::test(start_paused = true)]
async fn settings_change_triggers_a_pass() {
    let run = start(harness());
    let h = &run.harness;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(passes(h).await, 1);

    let mut settings = h.state.current_settings();
    settings.worksheet_name = "Archive".to_string();
    h.state.settings.send_replace(settings);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(passes(h).await, 2);
    assert_eq!(h.source.reads(), 2);
    assert_eq!(
        h.state.controller.status().await.view.unwrap().worksheet_name,
        "Archive"
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_scheduler() {
    let run = start(harness());
    tokio::time::sleep(Duration::from_secs(1)).await;

    run.shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), run.task)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}
