//! Step-by-step connection check: credentials, authentication, document,
//! first worksheet, records. Reads bypass the snapshot cache.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::sheets::ConnectionProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiagnosticStep {
    pub name: String,
    pub status: StepStatus,
    pub detail: String,
    /// Likely causes, for permission failures
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiagnosticReport {
    pub ok: bool,
    pub steps: Vec<DiagnosticStep>,
}

pub const STEP_NAMES: [&str; 5] = [
    "credentials",
    "authentication",
    "open_document",
    "first_worksheet",
    "read_records",
];

const PERMISSION_HINTS: [&str; 3] = [
    "Service account doesn't have access to the sheet",
    "Google Sheets API is not enabled",
    "Service account is disabled",
];

struct Walk {
    steps: Vec<DiagnosticStep>,
}

impl Walk {
    fn ok(&mut self, detail: String) {
        self.push(StepStatus::Ok, detail, Vec::new());
    }

    fn fail(&mut self, error: &AppError) -> DiagnosticReport {
        let hints = match error {
            AppError::Permission(_) => PERMISSION_HINTS.iter().map(ToString::to_string).collect(),
            _ => Vec::new(),
        };
        tracing::warn!(step = STEP_NAMES[self.steps.len()], error = %error, "Diagnostic step failed");
        self.push(StepStatus::Failed, error.to_string(), hints);

        while self.steps.len() < STEP_NAMES.len() {
            self.push(StepStatus::Skipped, String::new(), Vec::new());
        }
        self.finish()
    }

    fn push(&mut self, status: StepStatus, detail: String, hints: Vec<String>) {
        self.steps.push(DiagnosticStep {
            name: STEP_NAMES[self.steps.len()].to_string(),
            status,
            detail,
            hints,
        });
    }

    fn finish(&mut self) -> DiagnosticReport {
        let steps = std::mem::take(&mut self.steps);
        DiagnosticReport {
            ok: steps.iter().all(|s| s.status == StepStatus::Ok),
            steps,
        }
    }
}

/// Walk the connection path for `locator`, stopping at the first failure.
///
/// `credentials` is the outcome of loading key material (the service
/// account email on success).
pub async fn run_diagnostics(
    credentials: AppResult<String>,
    connections: &ConnectionProvider,
    locator: &str,
) -> DiagnosticReport {
    let mut walk = Walk { steps: Vec::new() };

    match credentials {
        Ok(email) => walk.ok(format!("Service account: {email}")),
        Err(e) => return walk.fail(&e),
    }

    let handle = match connections.acquire().await {
        Ok(handle) => handle,
        Err(e) => return walk.fail(&e),
    };
    walk.ok(match handle.identity() {
        Some(identity) => format!("Authenticated as {identity}"),
        None => "Authenticated".to_string(),
    });

    let info = match handle.describe(locator).await {
        Ok(info) => info,
        Err(e) => return walk.fail(&e),
    };
    walk.ok(format!("Sheet opened: {}", info.title));

    let Some(first) = info.worksheets.first() else {
        return walk.fail(&AppError::NotFound("Document has no worksheets".to_string()));
    };
    walk.ok(format!("Worksheet: {first}"));

    match handle.read_records(locator, first).await {
        Ok(snapshot) => walk.ok(format!("Found {} rows", snapshot.len())),
        Err(e) => return walk.fail(&e),
    }

    tracing::info!(sheet_url = %locator, "Connection diagnostics passed");
    walk.finish()
}
