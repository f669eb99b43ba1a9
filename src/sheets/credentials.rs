use serde::Deserialize;
use std::path::Path;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Read-only scopes needed to open a document and read its values.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a service-account key file we need.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse key material from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Authentication` if the JSON is malformed or lacks
    /// the client email or private key.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        let key: Self = serde_json::from_str(raw)
            .map_err(|e| AppError::Authentication(format!("Invalid service account key: {e}")))?;

        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(AppError::Authentication(
                "Service account key is missing client_email or private_key".to_string(),
            ));
        }

        Ok(key)
    }

    /// # Errors
    ///
    /// Returns `AppError::Authentication` if the file is absent, unreadable or malformed.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Authentication(format!(
                "Cannot read service account key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Resolve credentials the way the deployment provides them: inline JSON
    /// first, then the key file. A configured token URI overrides the key's.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Authentication` if no usable key material is found.
    pub fn load(config: &Config) -> AppResult<Self> {
        let mut key = match &config.service_account_json {
            Some(raw) => Self::from_json(raw)?,
            None => Self::from_file(Path::new(&config.service_account_file))?,
        };

        if let Some(uri) = &config.token_uri_override {
            key.token_uri.clone_from(uri);
        }

        tracing::debug!(client_email = %key.client_email, "Service account credentials loaded");
        Ok(key)
    }
}
