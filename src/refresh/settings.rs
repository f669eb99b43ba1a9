use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{Config, RefreshMode};
use crate::error::{AppError, AppResult};
use crate::refresh::state::WaitMode;

pub const MIN_REFRESH_INTERVAL_SECS: u64 = 1;
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 60;

/// Sidebar configuration of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardSettings {
    /// Google Sheet URL (or bare document key)
    pub sheet_url: String,
    /// Worksheet name
    pub worksheet_name: String,
    /// Auto-refresh interval in seconds (1-60)
    pub refresh_interval_secs: u64,
    pub auto_refresh: bool,
}

impl DashboardSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            sheet_url: config.default_sheet_url.clone(),
            worksheet_name: config.default_worksheet_name.clone(),
            refresh_interval_secs: config.default_refresh_interval_seconds,
            auto_refresh: config.default_auto_refresh,
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank locator or worksheet name,
    /// or an interval outside 1-60 seconds.
    pub fn validate(&self) -> AppResult<()> {
        if self.sheet_url.trim().is_empty() {
            return Err(AppError::BadRequest("sheet_url must not be empty".to_string()));
        }
        if self.worksheet_name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "worksheet_name must not be empty".to_string(),
            ));
        }
        if !(MIN_REFRESH_INTERVAL_SECS..=MAX_REFRESH_INTERVAL_SECS)
            .contains(&self.refresh_interval_secs)
        {
            return Err(AppError::BadRequest(format!(
                "refresh_interval_secs must be between {MIN_REFRESH_INTERVAL_SECS} and {MAX_REFRESH_INTERVAL_SECS}"
            )));
        }
        Ok(())
    }

    /// What the scheduler waits for after a successful pass.
    #[must_use]
    pub fn wait_mode(&self, config: &Config) -> WaitMode {
        match config.refresh_mode {
            RefreshMode::Fixed => WaitMode::FixedLongDelay {
                seconds: config.fixed_refresh_delay_seconds,
            },
            RefreshMode::Interactive if self.auto_refresh => WaitMode::TimedInterval {
                seconds: self.refresh_interval_secs,
            },
            RefreshMode::Interactive => WaitMode::Manual,
        }
    }
}
