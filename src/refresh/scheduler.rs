use std::time::Duration;
use tokio::sync::watch;

use crate::common::AppState;
use crate::refresh::settings::DashboardSettings;

/// Why the scheduler woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    /// Run a pass; `force` bypasses the cache.
    Pass { force: bool },
    /// A manual refresh already rendered; only restart the timer.
    Rearm,
}

/// Run the refresh cycle until `shutdown` flips to `true` (or its sender is
/// dropped).
///
/// Renders once on startup, then waits according to the current
/// [`WaitMode`](crate::refresh::state::WaitMode): a settings change or a
/// manual refresh always restarts the wait, the timer only runs after a
/// successful pass.
pub async fn run_refresh_cycle(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut settings_rx = state.settings.subscribe();

    tracing::info!(
        mode = ?state.config.refresh_mode,
        fixed_delay_secs = state.config.fixed_refresh_delay_seconds,
        cache_ttl_secs = state.config.cache_ttl_seconds,
        "Starting refresh scheduler"
    );

    let mut wake = Wake::Pass { force: false };

    loop {
        let settings = settings_rx.borrow_and_update().clone();
        let wait = settings.wait_mode(&state.config);

        if let Wake::Pass { force } = wake {
            run_pass(&state, &settings, force).await;
        }

        let delay = if state.controller.arm(wait).await {
            wait.delay_secs()
        } else {
            None
        };

        wake = tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("Refresh scheduler stopping");
                break;
            }
            changed = settings_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::debug!("Dashboard settings changed");
                Wake::Pass { force: false }
            }
            () = state.controller.rearmed() => Wake::Rearm,
            () = sleep_for(delay) => Wake::Pass { force: wait.forces_refetch() },
        };
    }
}

async fn sleep_for(delay: Option<u64>) {
    match delay {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => std::future::pending::<()>().await,
    }
}

/// One scheduled pass, retrying transient source failures up to
/// `REFRESH_RETRY_MAX` times.
async fn run_pass(state: &AppState, settings: &DashboardSettings, force: bool) {
    let max_retries = state.config.refresh_retry_max;
    let retry_delay_secs = state.config.refresh_retry_delay_seconds;
    let mut retries = 0;

    loop {
        let result = if force {
            state.controller.forced_refresh(settings).await
        } else {
            state.controller.render_pass(settings).await
        };

        match result {
            Ok(_) => {
                tracing::debug!(force, "Scheduled refresh completed");
                return;
            }
            Err(e) if e.is_transient() && retries < max_retries => {
                retries += 1;
                tracing::warn!(
                    error = %e,
                    retry = retries,
                    max_retries,
                    delay_secs = retry_delay_secs,
                    "Refresh failed, retrying"
                );
                tokio::time::sleep(Duration::from_secs(retry_delay_secs)).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh cycle halted until next manual refresh or settings change");
                return;
            }
        }
    }
}
