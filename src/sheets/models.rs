use serde::{Deserialize, Serialize};

/// Response from the OAuth2 token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Response from `GET /spreadsheets/{id}/values/{range}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    /// Rows of cells; trailing empty rows and cells are omitted by the API.
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

/// Response from `GET /spreadsheets/{id}?fields=properties.title,sheets.properties`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetMetadata {
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetProperties {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Document summary used by the connection diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SpreadsheetInfo {
    pub title: String,
    /// Worksheet titles ordered by their index in the document.
    pub worksheets: Vec<String>,
}

impl From<SpreadsheetMetadata> for SpreadsheetInfo {
    fn from(meta: SpreadsheetMetadata) -> Self {
        let mut sheets = meta.sheets;
        sheets.sort_by_key(|s| s.properties.index);
        Self {
            title: meta.properties.title,
            worksheets: sheets.into_iter().map(|s| s.properties.title).collect(),
        }
    }
}
