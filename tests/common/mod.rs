//! Shared fakes for integration tests.
//!
//! `FakeSource` stands in for the remote spreadsheet and counts reads;
//! `FakeConnector` hands it out and counts connection attempts.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vote_board::common::AppState;
use vote_board::config::Config;
use vote_board::error::{AppError, AppResult};
use vote_board::sheets::models::SpreadsheetInfo;
use vote_board::sheets::{Connector, SheetSource, TabularSnapshot};

/// Build a snapshot with a `Candidates`/`Votes` header.
pub fn votes(rows: &[(&str, i64)]) -> TabularSnapshot {
    let mut grid: Vec<Vec<Value>> = vec![vec![json!("Candidates"), json!("Votes")]];
    grid.extend(rows.iter().map(|(name, n)| vec![json!(name), json!(n)]));
    TabularSnapshot::from_values(grid).unwrap()
}

/// Config suitable for tests: no rate limiting, inline dummy credentials.
pub fn test_config() -> Config {
    Config {
        disable_rate_limiting: true,
        service_account_json: Some(
            r#"{"client_email": "board@test.iam.gserviceaccount.com", "private_key": "dummy"}"#
                .to_string(),
        ),
        ..Config::default()
    }
}

pub struct FakeSource {
    reads: AtomicUsize,
    read_delay_ms: AtomicU64,
    response: Mutex<AppResult<TabularSnapshot>>,
    info: Mutex<AppResult<SpreadsheetInfo>>,
}

impl FakeSource {
    pub fn with_snapshot(snapshot: TabularSnapshot) -> Arc<Self> {
        Arc::new(Self {
            reads: AtomicUsize::new(0),
            read_delay_ms: AtomicU64::new(0),
            response: Mutex::new(Ok(snapshot)),
            info: Mutex::new(Ok(SpreadsheetInfo {
                title: "Election Results".to_string(),
                worksheets: vec!["Sheet1".to_string(), "Archive".to_string()],
            })),
        })
    }

    pub fn failing(error: AppError) -> Arc<Self> {
        let source = Self::with_snapshot(TabularSnapshot::default());
        source.set_response(Err(error));
        source
    }

    pub fn set_response(&self, response: AppResult<TabularSnapshot>) {
        *self.response.lock().unwrap() = response;
    }

    /// Make every read take `delay` before answering.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_describe(&self, info: AppResult<SpreadsheetInfo>) {
        *self.info.lock().unwrap() = info;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SheetSource for FakeSource {
    async fn read_records(&self, _locator: &str, _sheet_name: &str) -> AppResult<TabularSnapshot> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay_ms = self.read_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        self.response.lock().unwrap().clone()
    }

    async fn describe(&self, _locator: &str) -> AppResult<SpreadsheetInfo> {
        self.info.lock().unwrap().clone()
    }

    fn identity(&self) -> Option<String> {
        Some("board@test.iam.gserviceaccount.com".to_string())
    }
}

pub struct FakeConnector {
    source: Arc<FakeSource>,
    connects: Arc<AtomicUsize>,
    failures_left: AtomicUsize,
}

impl FakeConnector {
    pub fn new(source: Arc<FakeSource>) -> (Self, Arc<AtomicUsize>) {
        Self::failing_first(source, 0)
    }

    /// Reject the first `failures` connection attempts with an
    /// authentication error.
    pub fn failing_first(source: Arc<FakeSource>, failures: usize) -> (Self, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = Self {
            source,
            connects: Arc::clone(&connects),
            failures_left: AtomicUsize::new(failures),
        };
        (connector, connects)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> AppResult<Arc<dyn SheetSource>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Authentication("invalid_grant".to_string()));
        }
        let handle: Arc<dyn SheetSource> = self.source.clone();
        Ok(handle)
    }
}

pub struct Harness {
    pub state: AppState,
    pub source: Arc<FakeSource>,
    pub connects: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new(config: Config, source: Arc<FakeSource>) -> Self {
        let (connector, connects) = FakeConnector::new(Arc::clone(&source));
        Self {
            state: AppState::new(config, Box::new(connector)),
            source,
            connects,
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}
