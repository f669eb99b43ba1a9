//! Tabular snapshot of one worksheet read.
//!
//! The Sheets API returns a rectangular-ish grid of cells. A snapshot turns
//! it into records keyed by the header row:
//!
//! - the first row names the columns; columns with a blank header are dropped
//! - shorter rows are padded with `""`
//! - numeric-looking strings become numbers, blanks stay `""`
//! - rows with no non-blank cell are skipped

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

use crate::error::{AppError, AppResult};

/// One row: column name to cell value, in header order.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularSnapshot {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl TabularSnapshot {
    /// Build a snapshot from an API value grid.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Schema` if two columns share a header name.
    pub fn from_values(values: Vec<Vec<Value>>) -> AppResult<Self> {
        let mut grid = values.into_iter();
        let Some(header_row) = grid.next() else {
            return Ok(Self::default());
        };

        // (source index, column name)
        let mut header: Vec<(usize, String)> = Vec::with_capacity(header_row.len());
        let mut seen = HashSet::new();
        for (idx, cell) in header_row.iter().enumerate() {
            let name = cell_text(cell).trim().to_string();
            if name.is_empty() {
                continue;
            }
            if !seen.insert(name.clone()) {
                return Err(AppError::Schema(format!(
                    "Header row contains duplicate column '{name}'"
                )));
            }
            header.push((idx, name));
        }

        let rows = grid
            .filter(|row| row.iter().any(|cell| !cell_text(cell).trim().is_empty()))
            .map(|row| {
                header
                    .iter()
                    .map(|(idx, name)| {
                        let cell = row.get(*idx).cloned().unwrap_or(Value::Null);
                        (name.clone(), numericise(cell))
                    })
                    .collect::<Record>()
            })
            .collect();

        Ok(Self {
            columns: header.into_iter().map(|(_, name)| name).collect(),
            rows,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Render as CSV with a header line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the CSV writer fails.
    pub fn to_csv(&self) -> AppResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        for row in &self.rows {
            let cells = self
                .columns
                .iter()
                .map(|c| row.get(c).map(cell_text).unwrap_or_default());
            writer
                .write_record(cells)
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// Display text of a cell as a spreadsheet would show it.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numericise(value: Value) -> Value {
    let text = match &value {
        Value::Null => return Value::String(String::new()),
        Value::String(text) => text,
        _ => return value,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(rows: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(rows).unwrap()
    }

    #[test]
    fn header_row_keys_each_record() {
        let snapshot = TabularSnapshot::from_values(grid(json!([
            ["Candidate", "Votes"],
            ["A", 10],
            ["B", "20"],
        ])))
        .unwrap();

        assert_eq!(snapshot.columns(), ["Candidate", "Votes"]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.rows()[0]["Candidate"], json!("A"));
        assert_eq!(snapshot.rows()[1]["Votes"], json!(20));
    }

    #[test]
    fn short_rows_are_padded_and_blank_rows_skipped() {
        let snapshot = TabularSnapshot::from_values(grid(json!([
            ["Candidate", "Votes", "Party"],
            ["A", 10],
            [],
            ["", "  "],
            ["B", 3.5, "X"],
        ])))
        .unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.rows()[0]["Party"], json!(""));
        assert_eq!(snapshot.rows()[1]["Votes"], json!(3.5));
    }

    #[test]
    fn header_only_grid_is_empty() {
        let snapshot = TabularSnapshot::from_values(grid(json!([["Candidate", "Votes"]]))).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.has_column("Votes"));

        assert!(TabularSnapshot::from_values(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = TabularSnapshot::from_values(grid(json!([["Votes", "Votes"], [1, 2]]))).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn csv_follows_column_order() {
        let snapshot =
            TabularSnapshot::from_values(grid(json!([["Candidate", "Votes"], ["A, Jr.", 10]])))
                .unwrap();
        let csv = String::from_utf8(snapshot.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Candidate,Votes\n\"A, Jr.\",10\n");
    }
}
