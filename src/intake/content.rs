// src/intake/content.rs
//! Full-file value checks for numeric columns.
//!
//! The preview only looks at the first few rows; these checks walk every data
//! row so a bad value on line 10 000 is caught before upload.

use tracing::debug;

use super::{error::IntakeError, parse};
use crate::schema::SchemaSpec;

/// How many offending row numbers a rejection lists.
pub const MAX_REPORTED_ROWS: usize = 5;

/// Rows of one column holding a blank or non-numeric value.
#[derive(Debug, Default)]
struct ColumnIssues {
    rows: Vec<usize>,
    has_text: bool,
}

impl ColumnIssues {
    fn note(&mut self, line: usize, is_text: bool) {
        self.has_text |= is_text;
        if self.rows.len() < MAX_REPORTED_ROWS {
            self.rows.push(line);
        }
    }
}

/// `true` if `value` is a finite number once surrounding whitespace is removed.
pub fn is_numeric(value: &str) -> bool {
    value.trim().parse::<f64>().map_or(false, f64::is_finite)
}

/// Walk every data row and reject the first numeric column holding a
/// non-numeric or empty value. Row numbers are file line numbers, so the
/// first data row is row 2.
///
/// Columns are checked in schema order. A column with any non-numeric text is
/// `InvalidNumeric`, and its row list covers blank cells too; a column that is
/// only missing values is `EmptyValues`.
pub fn check_numeric_columns(content: &[u8], schema: &SchemaSpec) -> Result<(), IntakeError> {
    let mut rdr = parse::reader(content);
    let headers = rdr.headers()?.clone();

    // (column name, header index) for each numeric column present in the file
    let targets: Vec<(&str, usize)> = schema
        .numeric_columns
        .iter()
        .filter_map(|col| {
            headers
                .iter()
                .position(|h| h == col.as_str())
                .map(|idx| (col.as_str(), idx))
        })
        .collect();
    if targets.is_empty() {
        return Ok(());
    }

    let mut issues: Vec<ColumnIssues> = targets.iter().map(|_| ColumnIssues::default()).collect();
    let mut scanned = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = idx + 2;
        for ((_, col_idx), found) in targets.iter().zip(issues.iter_mut()) {
            let value = record.get(*col_idx).unwrap_or("");
            if value.trim().is_empty() {
                found.note(line, false);
            } else if !is_numeric(value) {
                found.note(line, true);
            }
        }
        scanned += 1;
    }
    debug!(rows = scanned, columns = targets.len(), "numeric scan finished");

    for ((column, _), found) in targets.into_iter().zip(issues) {
        if found.rows.is_empty() {
            continue;
        }
        let column = column.to_string();
        return Err(if found.has_text {
            IntakeError::InvalidNumeric {
                column,
                rows: found.rows,
            }
        } else {
            IntakeError::EmptyValues {
                column,
                rows: found.rows,
            }
        });
    }

    Ok(())
}
