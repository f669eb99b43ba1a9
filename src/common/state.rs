use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::Config;
use crate::refresh::{DashboardSettings, RefreshController};
use crate::services::cache::SnapshotCache;
use crate::sheets::{ConnectionProvider, Connector};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub controller: Arc<RefreshController>,
    /// Current sidebar settings; the scheduler subscribes to changes.
    pub settings: Arc<watch::Sender<DashboardSettings>>,
}

impl AppState {
    pub fn new(config: Config, connector: Box<dyn Connector>) -> Self {
        let cache = SnapshotCache::new(Duration::from_secs(config.cache_ttl_seconds));
        let controller = RefreshController::new(ConnectionProvider::new(connector), cache);
        let (settings, _) = watch::channel(DashboardSettings::from_config(&config));

        Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
            settings: Arc::new(settings),
        }
    }

    #[must_use]
    pub fn current_settings(&self) -> DashboardSettings {
        self.settings.borrow().clone()
    }
}
