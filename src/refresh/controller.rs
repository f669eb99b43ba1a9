use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use utoipa::ToSchema;

use crate::chart::{build_chart, ChartSpec};
use crate::error::{AppError, AppResult};
use crate::refresh::settings::DashboardSettings;
use crate::refresh::state::{RefreshEvent, RefreshState, WaitMode};
use crate::services::cache::{Lookup, SnapshotCache, SnapshotKey};
use crate::sheets::{ConnectionProvider, Record, SheetSource};

/// Format of the "Last updated" caption.
pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything the page needs to draw one render.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardView {
    pub chart: ChartSpec,
    pub columns: Vec<String>,
    /// Raw records shown in the collapsible data table
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Record>,
    pub sheet_url: String,
    pub worksheet_name: String,
    pub last_updated: DateTime<Utc>,
    /// `last_updated` in server local time, `YYYY-MM-DD HH:MM:SS`
    pub last_updated_display: String,
    /// When the underlying snapshot was read from the source
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

/// A failed pass as shown to the user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ErrorReport {
    fn new(error: &AppError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ControllerStatus {
    pub state: RefreshState,
    pub view: Option<DashboardView>,
    /// Set while the cycle is failed
    pub error: Option<ErrorReport>,
    pub passes: u64,
    pub connected: bool,
}

/// Cache entries dropped at the start of a pass.
#[derive(Debug, Clone, Copy)]
enum Invalidate {
    Nothing,
    /// The configured worksheet's entry
    Current,
    All,
}

struct Status {
    state: RefreshState,
    view: Option<Arc<DashboardView>>,
    error: Option<ErrorReport>,
    passes: u64,
}

/// Owns the poll/cache/render cycle.
///
/// Render passes are serialized: at most one remote read is in flight per
/// controller. The connection handle and snapshot cache are shared by all
/// passes.
pub struct RefreshController {
    connections: ConnectionProvider,
    cache: SnapshotCache,
    status: RwLock<Status>,
    pass_lock: Mutex<()>,
    rearm: Notify,
}

impl RefreshController {
    #[must_use]
    pub fn new(connections: ConnectionProvider, cache: SnapshotCache) -> Self {
        Self {
            connections,
            cache,
            status: RwLock::new(Status {
                state: RefreshState::Idle,
                view: None,
                error: None,
                passes: 0,
            }),
            pass_lock: Mutex::new(()),
            rearm: Notify::new(),
        }
    }

    #[must_use]
    pub fn connections(&self) -> &ConnectionProvider {
        &self.connections
    }

    /// Return the shared connection handle, creating it on first use.
    ///
    /// # Errors
    ///
    /// `AppError::Authentication` if credentials are absent or rejected.
    pub async fn acquire_connection(&self) -> AppResult<Arc<dyn SheetSource>> {
        self.connections.acquire().await
    }

    /// Read `(locator, sheet_name)` through the snapshot cache.
    ///
    /// # Errors
    ///
    /// Propagates the source's `SourceUnavailable`, `NotFound`, `Permission`,
    /// `Authentication` or `Schema` errors.
    pub async fn fetch_snapshot(
        &self,
        handle: &Arc<dyn SheetSource>,
        locator: &str,
        sheet_name: &str,
    ) -> AppResult<Lookup> {
        let key = SnapshotKey::new(locator, sheet_name);
        self.cache
            .get_or_fetch(key, handle.read_records(locator, sheet_name))
            .await
    }

    /// Acquire the connection and read the configured worksheet through the
    /// cache, without touching the refresh state.
    ///
    /// # Errors
    ///
    /// See [`RefreshController::fetch_snapshot`].
    pub async fn current_snapshot(&self, settings: &DashboardSettings) -> AppResult<Lookup> {
        let handle = self.acquire_connection().await?;
        self.fetch_snapshot(&handle, &settings.sheet_url, &settings.worksheet_name)
            .await
    }

    /// Run one pass: fetch (cached), check for data, build the chart and
    /// publish the view. Any failure moves the cycle to `Failed`.
    ///
    /// # Errors
    ///
    /// Any error of the taxonomy; `EmptyData` when the sheet has no rows.
    pub async fn render_pass(&self, settings: &DashboardSettings) -> AppResult<Arc<DashboardView>> {
        self.run_pass(settings, Invalidate::Nothing).await
    }

    /// The cache is cleared only once the pass lock is held, so a pass still
    /// in flight cannot repopulate it before this pass reads.
    async fn run_pass(
        &self,
        settings: &DashboardSettings,
        invalidate: Invalidate,
    ) -> AppResult<Arc<DashboardView>> {
        let _pass = self.pass_lock.lock().await;

        match invalidate {
            Invalidate::Nothing => {}
            Invalidate::Current => {
                self.cache
                    .invalidate(&SnapshotKey::new(&settings.sheet_url, &settings.worksheet_name))
                    .await;
            }
            Invalidate::All => self.cache.invalidate_all(),
        }

        self.transition(RefreshEvent::Trigger).await;

        let result = self.build_view(settings).await;

        let mut status = self.status.write().await;
        status.passes += 1;
        match &result {
            Ok(view) => {
                advance(&mut status.state, RefreshEvent::Succeeded);
                status.view = Some(Arc::clone(view));
                status.error = None;
                tracing::info!(
                    sheet = %settings.worksheet_name,
                    bars = view.chart.bars.len(),
                    from_cache = view.from_cache,
                    "Dashboard rendered"
                );
            }
            Err(e) => {
                advance(&mut status.state, RefreshEvent::Failed);
                status.error = Some(ErrorReport::new(e));
                tracing::error!(
                    error = %e,
                    kind = e.kind(),
                    sheet_url = %settings.sheet_url,
                    sheet = %settings.worksheet_name,
                    "Render pass failed"
                );
            }
        }
        result
    }

    async fn build_view(&self, settings: &DashboardSettings) -> AppResult<Arc<DashboardView>> {
        let lookup = self.current_snapshot(settings).await?;
        let snapshot = &lookup.entry.snapshot;

        if snapshot.is_empty() {
            return Err(AppError::EmptyData);
        }

        let chart = build_chart(snapshot)?;
        let now = Utc::now();

        Ok(Arc::new(DashboardView {
            chart,
            columns: snapshot.columns().to_vec(),
            rows: snapshot.rows().to_vec(),
            sheet_url: settings.sheet_url.clone(),
            worksheet_name: settings.worksheet_name.clone(),
            last_updated: now,
            last_updated_display: now
                .with_timezone(&Local)
                .format(LAST_UPDATED_FORMAT)
                .to_string(),
            fetched_at: lookup.entry.fetched_at,
            from_cache: lookup.hit,
        }))
    }

    /// User-initiated refresh: clear the cache, fetch and render now, then
    /// tell the scheduler to re-arm its timer.
    ///
    /// # Errors
    ///
    /// See [`RefreshController::render_pass`].
    pub async fn manual_refresh(&self, settings: &DashboardSettings) -> AppResult<Arc<DashboardView>> {
        tracing::info!(sheet = %settings.worksheet_name, "Manual refresh requested");
        let result = self.run_pass(settings, Invalidate::All).await;
        self.rearm.notify_one();
        result
    }

    /// Scheduled forced refresh: drop the configured worksheet's entry and
    /// render.
    ///
    /// # Errors
    ///
    /// See [`RefreshController::render_pass`].
    pub async fn forced_refresh(&self, settings: &DashboardSettings) -> AppResult<Arc<DashboardView>> {
        self.run_pass(settings, Invalidate::Current).await
    }

    /// Schedule the next pass. Returns `false` when the cycle cannot be armed
    /// (failed, or a pass is running).
    pub async fn arm(&self, wait: WaitMode) -> bool {
        let mut status = self.status.write().await;
        match status.state.apply(RefreshEvent::Arm(wait)) {
            Some(next) => {
                status.state = next;
                tracing::debug!(wait = ?wait, "Refresh cycle armed");
                true
            }
            None => {
                tracing::debug!(state = ?status.state, "Refresh cycle not armed");
                false
            }
        }
    }

    /// Resolves after a manual refresh completes.
    pub async fn rearmed(&self) {
        self.rearm.notified().await;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connections.is_connected()
    }

    pub async fn state(&self) -> RefreshState {
        self.status.read().await.state
    }

    pub async fn status(&self) -> ControllerStatus {
        let status = self.status.read().await;
        ControllerStatus {
            state: status.state,
            view: status.view.as_deref().cloned(),
            error: status.error.clone(),
            passes: status.passes,
            connected: self.is_connected(),
        }
    }

    async fn transition(&self, event: RefreshEvent) {
        let mut status = self.status.write().await;
        advance(&mut status.state, event);
    }
}

fn advance(state: &mut RefreshState, event: RefreshEvent) {
    match state.apply(event) {
        Some(next) => *state = next,
        None => tracing::warn!(state = ?state, event = ?event, "Ignored refresh transition"),
    }
}
