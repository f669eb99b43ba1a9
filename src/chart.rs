//! Bar chart specification built from a vote snapshot.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::sheets::snapshot::{cell_text, TabularSnapshot};

/// Bar colors, assigned by row position and reused from the start once a
/// sheet has more candidates than colors.
pub const PALETTE: [&str; 4] = ["#7FDBDA", "#4DB8D8", "#3B9BC4", "#2E5F8C"];

pub const VOTES_COLUMN: &str = "Votes";

/// Accepted names for the candidate column, in order of preference.
pub const CANDIDATE_COLUMNS: [&str; 2] = ["Candidates", "Candidate"];

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Bar {
    /// Candidate name (x axis)
    pub label: String,
    /// Vote count (bar height)
    pub value: f64,
    pub color: String,
    /// Text drawn on the bar
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub height: u32,
    pub show_legend: bool,
    pub background: String,
    pub font_size: u32,
    /// Column the bar labels were read from
    pub candidate_column: String,
    pub bars: Vec<Bar>,
}

/// Pick the candidate column present in `snapshot`.
///
/// # Errors
///
/// Returns `AppError::Schema` if no accepted candidate column exists.
pub fn candidate_column(snapshot: &TabularSnapshot) -> AppResult<&'static str> {
    CANDIDATE_COLUMNS
        .into_iter()
        .find(|name| snapshot.has_column(name))
        .ok_or_else(|| {
            AppError::Schema(format!(
                "Expected a '{}' or '{}' column, found [{}]",
                CANDIDATE_COLUMNS[0],
                CANDIDATE_COLUMNS[1],
                snapshot.columns().join(", ")
            ))
        })
}

fn vote_count(value: &Value) -> Option<f64> {
    let votes: f64 = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    votes.is_finite().then_some(votes)
}

/// Bar label text: integral counts without a decimal point.
fn vote_text(votes: f64) -> String {
    if votes.fract() == 0.0 && votes.abs() < 1e15 {
        format!("{votes:.0}")
    } else {
        votes.to_string()
    }
}

/// Build the vote chart for `snapshot`.
///
/// Deterministic: the same snapshot always yields the same spec.
///
/// # Errors
///
/// Returns `AppError::Schema` if the candidate or `Votes` column is missing,
/// or a vote cell is not numeric.
pub fn build_chart(snapshot: &TabularSnapshot) -> AppResult<ChartSpec> {
    let candidate_col = candidate_column(snapshot)?;
    if !snapshot.has_column(VOTES_COLUMN) {
        return Err(AppError::Schema(format!(
            "Expected a '{VOTES_COLUMN}' column, found [{}]",
            snapshot.columns().join(", ")
        )));
    }

    let bars = snapshot
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let raw_votes = row.get(VOTES_COLUMN).unwrap_or(&Value::Null);
            let value = vote_count(raw_votes).ok_or_else(|| {
                AppError::Schema(format!(
                    "Row {}: '{VOTES_COLUMN}' is not a number ({raw_votes})",
                    idx + 2
                ))
            })?;

            Ok(Bar {
                label: row.get(candidate_col).map(cell_text).unwrap_or_default(),
                value,
                color: PALETTE[idx % PALETTE.len()].to_string(),
                text: vote_text(value),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ChartSpec {
        title: "Candidate Votes".to_string(),
        x_axis_title: String::new(),
        y_axis_title: VOTES_COLUMN.to_string(),
        height: 500,
        show_legend: false,
        background: "white".to_string(),
        font_size: 14,
        candidate_column: candidate_col.to_string(),
        bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_text_drops_integral_decimals() {
        assert_eq!(vote_text(10.0), "10");
        assert_eq!(vote_text(2.5), "2.5");
    }

    #[test]
    fn numeric_strings_count_as_votes() {
        assert_eq!(vote_count(&Value::String(" 42 ".into())), Some(42.0));
        assert_eq!(vote_count(&Value::String("n/a".into())), None);
        assert_eq!(vote_count(&Value::Null), None);
        assert_eq!(vote_count(&Value::String("NaN".into())), None);
        assert_eq!(vote_count(&Value::String("-inf".into())), None);
    }
}
