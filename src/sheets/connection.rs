use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::error::AppResult;
use crate::sheets::client::SheetsClient;
use crate::sheets::credentials::ServiceAccountKey;
use crate::sheets::models::SpreadsheetInfo;
use crate::sheets::snapshot::TabularSnapshot;

/// A remote, read-only tabular document store.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Read all records of `sheet_name` in the document at `locator`.
    async fn read_records(&self, locator: &str, sheet_name: &str) -> AppResult<TabularSnapshot>;

    /// Document title and worksheet titles.
    async fn describe(&self, locator: &str) -> AppResult<SpreadsheetInfo>;

    /// Account the handle is authenticated as, if any.
    fn identity(&self) -> Option<String> {
        None
    }
}

/// Creates authenticated handles. Called at most once per successful
/// [`ConnectionProvider::acquire`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> AppResult<Arc<dyn SheetSource>>;
}

/// Connects with a Google service-account key.
pub struct ServiceAccountConnector {
    config: Arc<Config>,
}

impl ServiceAccountConnector {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for ServiceAccountConnector {
    async fn connect(&self) -> AppResult<Arc<dyn SheetSource>> {
        let key = ServiceAccountKey::load(&self.config)?;
        let client = SheetsClient::new(&self.config, &key)?;
        client.authorize().await?;

        tracing::info!(client_email = %client.client_email(), "Connected to Google Sheets");
        Ok(Arc::new(client))
    }
}

/// Process-wide holder of the single connection handle.
///
/// The first successful [`acquire`](Self::acquire) stores the handle; every
/// later call returns the same `Arc`. Failed attempts store nothing.
pub struct ConnectionProvider {
    connector: Box<dyn Connector>,
    handle: OnceCell<Arc<dyn SheetSource>>,
}

impl ConnectionProvider {
    #[must_use]
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            handle: OnceCell::new(),
        }
    }

    /// # Errors
    ///
    /// Propagates the connector's error, typically `AppError::Authentication`.
    pub async fn acquire(&self) -> AppResult<Arc<dyn SheetSource>> {
        self.handle
            .get_or_try_init(|| async {
                tracing::debug!("Acquiring data source connection");
                self.connector.connect().await
            })
            .await
            .cloned()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }
}
