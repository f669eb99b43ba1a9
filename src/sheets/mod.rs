pub mod auth;
pub mod client;
pub mod connection;
pub mod credentials;
pub mod models;
pub mod snapshot;

pub use client::SheetsClient;
pub use connection::{ConnectionProvider, Connector, ServiceAccountConnector, SheetSource};
pub use snapshot::{Record, TabularSnapshot};
