use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::sheets::auth::TokenProvider;
use crate::sheets::connection::SheetSource;
use crate::sheets::credentials::ServiceAccountKey;
use crate::sheets::models::{ApiErrorEnvelope, SpreadsheetInfo, SpreadsheetMetadata, ValueRange};
use crate::sheets::snapshot::TabularSnapshot;

/// Extract the spreadsheet key from a document URL.
///
/// Accepts `https://docs.google.com/spreadsheets/d/{key}/edit...` as well as
/// a bare key.
///
/// # Errors
///
/// Returns `AppError::NotFound` if no key can be found.
pub fn spreadsheet_key(locator: &str) -> AppResult<String> {
    let locator = locator.trim();
    let not_found = || AppError::NotFound(format!("No spreadsheet key in '{locator}'"));

    if let Some((_, rest)) = locator.split_once("/d/") {
        let key: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        return if key.is_empty() { Err(not_found()) } else { Ok(key) };
    }

    let is_bare_key = !locator.is_empty()
        && locator
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if is_bare_key {
        Ok(locator.to_string())
    } else {
        Err(not_found())
    }
}

/// A1 range selecting a whole worksheet. Names are always quoted so that
/// spaces and punctuation survive.
fn sheet_range(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

/// Authenticated Google Sheets handle.
///
/// Construct once and share; it owns the HTTP connection pool and the
/// service-account token cache.
pub struct SheetsClient {
    http_client: Client,
    base_url: Url,
    tokens: TokenProvider,
}

impl SheetsClient {
    /// # Errors
    ///
    /// Returns `AppError::Authentication` for unusable key material and
    /// `AppError::Internal` if the HTTP client or base URL cannot be set up.
    pub fn new(config: &Config, key: &ServiceAccountKey) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&config.sheets_api_base_url).map_err(|e| {
            AppError::Internal(format!(
                "Invalid SHEETS_API_BASE_URL '{}': {e}",
                config.sheets_api_base_url
            ))
        })?;

        let tokens = TokenProvider::new(http_client.clone(), key)?;

        Ok(Self {
            http_client,
            base_url,
            tokens,
        })
    }

    #[must_use]
    pub fn client_email(&self) -> &str {
        self.tokens.client_email()
    }

    /// Obtain an access token now, so bad credentials fail at connect time
    /// rather than on the first read.
    ///
    /// # Errors
    ///
    /// See [`TokenProvider::access_token`].
    pub async fn authorize(&self) -> AppResult<()> {
        self.tokens.access_token().await.map(|_| ())
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Internal("SHEETS_API_BASE_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> AppResult<Response> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http_client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Request failed: {e}")))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_failure(response).await)
        }
    }

    /// Read every record of one worksheet.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown document or worksheet, `Permission` when the
    /// service account has no access, `Authentication` for a rejected token,
    /// `SourceUnavailable` for transport or server failures, `Schema` for an
    /// unusable header row.
    pub async fn read_worksheet(
        &self,
        locator: &str,
        sheet_name: &str,
    ) -> AppResult<TabularSnapshot> {
        let key = spreadsheet_key(locator)?;
        let range = sheet_range(sheet_name);
        let url = self.endpoint(&["spreadsheets", key.as_str(), "values", range.as_str()])?;

        let response = self
            .get(url, &[("valueRenderOption", "UNFORMATTED_VALUE")])
            .await?;

        let text = response
            .text()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Failed to read response: {e}")))?;

        let body: ValueRange = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse values response"
            );
            AppError::SourceUnavailable(format!("Failed to parse response: {e}"))
        })?;

        let snapshot = TabularSnapshot::from_values(body.values)?;
        tracing::debug!(
            spreadsheet = %key,
            sheet = %sheet_name,
            rows = snapshot.len(),
            "Worksheet read"
        );
        Ok(snapshot)
    }

    /// Fetch the document title and its worksheet titles.
    ///
    /// # Errors
    ///
    /// Same classification as [`SheetsClient::read_worksheet`].
    pub async fn describe_document(&self, locator: &str) -> AppResult<SpreadsheetInfo> {
        let key = spreadsheet_key(locator)?;
        let url = self.endpoint(&["spreadsheets", key.as_str()])?;

        let metadata: SpreadsheetMetadata = self
            .get(url, &[("fields", "properties.title,sheets.properties")])
            .await?
            .json()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Failed to parse response: {e}")))?;

        Ok(metadata.into())
    }
}

/// Map a non-success Sheets API response onto the error taxonomy.
async fn classify_failure(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|envelope| {
            if envelope.error.status.is_empty() {
                envelope.error.message
            } else {
                format!("{} ({})", envelope.error.message, envelope.error.status)
            }
        })
        .unwrap_or_else(|_| body.chars().take(200).collect());

    tracing::warn!(status = %status, message = %message, "Sheets API request failed");

    match status {
        StatusCode::UNAUTHORIZED => AppError::Authentication(message),
        StatusCode::FORBIDDEN => AppError::Permission(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::BAD_REQUEST if message.contains("Unable to parse range") => {
            AppError::NotFound(message)
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AppError::SourceUnavailable(format!("Rate limited (429): {message}"))
        }
        _ => AppError::SourceUnavailable(format!("HTTP {status}: {message}")),
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn read_records(&self, locator: &str, sheet_name: &str) -> AppResult<TabularSnapshot> {
        self.read_worksheet(locator, sheet_name).await
    }

    async fn describe(&self, locator: &str) -> AppResult<SpreadsheetInfo> {
        self.describe_document(locator).await
    }

    fn identity(&self) -> Option<String> {
        Some(self.client_email().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_extracted_from_document_url() {
        assert_eq!(
            spreadsheet_key(crate::config::DEFAULT_SHEET_URL).unwrap(),
            "15Lh2DmXAnBr9Aw1YHlNW31Tj3M9yvf7po7k9hl1s434"
        );
        assert_eq!(
            spreadsheet_key("https://docs.google.com/spreadsheets/d/abc_123-X").unwrap(),
            "abc_123-X"
        );
        assert_eq!(spreadsheet_key("abc_123").unwrap(), "abc_123");
    }

    #[test]
    fn locator_without_key_is_not_found() {
        assert!(matches!(
            spreadsheet_key("https://example.com/nothing here"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            spreadsheet_key("https://docs.google.com/spreadsheets/d/"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn sheet_names_are_quoted() {
        assert_eq!(sheet_range("Sheet1"), "'Sheet1'");
        assert_eq!(sheet_range("Bob's tally"), "'Bob''s tally'");
    }
}
