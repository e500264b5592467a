// src/intake/error.rs

use thiserror::Error;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Why an upload was turned away before leaving the machine.
///
/// All variants are user-correctable; the `Display` text is the message shown
/// to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("Only .csv files allowed.")]
    InvalidExtension { name: String },

    #[error("File exceeds {} limit.", format_limit(.limit_bytes))]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("CSV file is empty.")]
    EmptyFile,

    #[error(
        "Missing columns: {}. Required columns: {}",
        format_columns(.missing),
        format_columns(.required)
    )]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
    },

    #[error(
        "Unexpected columns: {}. Allowed columns: {}",
        format_columns(.unexpected),
        format_columns(.allowed)
    )]
    UnexpectedColumns {
        unexpected: Vec<String>,
        allowed: Vec<String>,
    },

    #[error("Failed to parse file: {reason}")]
    MalformedCsv { reason: String },

    #[error(
        "Invalid numeric value in column \"{column}\" at row(s): {}",
        format_rows(.rows)
    )]
    InvalidNumeric { column: String, rows: Vec<usize> },

    #[error(
        "Missing values in column \"{column}\" at row(s): {}",
        format_rows(.rows)
    )]
    EmptyValues { column: String, rows: Vec<usize> },
}

impl IntakeError {
    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::InvalidExtension { .. } => "invalid_extension",
            IntakeError::FileTooLarge { .. } => "file_too_large",
            IntakeError::EmptyFile => "empty_file",
            IntakeError::MissingColumns { .. } => "missing_columns",
            IntakeError::UnexpectedColumns { .. } => "unexpected_columns",
            IntakeError::MalformedCsv { .. } => "malformed_csv",
            IntakeError::InvalidNumeric { .. } => "invalid_numeric",
            IntakeError::EmptyValues { .. } => "empty_values",
        }
    }
}

impl From<csv::Error> for IntakeError {
    fn from(err: csv::Error) -> Self {
        IntakeError::MalformedCsv {
            reason: err.to_string(),
        }
    }
}

/// `10485760` → `"10MB"`, `1572864` → `"1.5MB"`, `2048` → `"2KB"`.
///
/// Limits under one MB fall back to KB, then bytes, so the number is never 0.
fn format_limit(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes >= MIB {
        format!("{}MB", scaled(bytes, MIB))
    } else if bytes >= KIB {
        format!("{}KB", scaled(bytes, KIB))
    } else {
        format!("{} bytes", bytes)
    }
}

fn scaled(bytes: u64, unit: u64) -> String {
    if bytes % unit == 0 {
        (bytes / unit).to_string()
    } else {
        let s = format!("{:.2}", bytes as f64 / unit as f64);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Joins column names for display; a blank header cell shows as `(blank)`.
fn format_columns(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| if c.is_empty() { "(blank)" } else { c.as_str() })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_rows(rows: &[usize]) -> String {
    rows.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_mentions_limit() {
        let err = IntakeError::FileTooLarge {
            size_bytes: 11 * MIB,
            limit_bytes: 10 * MIB,
        };
        assert_eq!(err.to_string(), "File exceeds 10MB limit.");
        assert_eq!(err.kind(), "file_too_large");
    }

    #[test]
    fn test_fractional_limit() {
        assert_eq!(format_limit(&(MIB + MIB / 2)), "1.5MB");
        assert_eq!(format_limit(&(512 * KIB)), "512KB");
    }

    #[test]
    fn test_small_limit_never_reads_as_zero() {
        let err = IntakeError::FileTooLarge {
            size_bytes: 4096,
            limit_bytes: 2048,
        };
        assert_eq!(err.to_string(), "File exceeds 2KB limit.");
        assert_eq!(format_limit(&1500), "1.46KB");
        assert_eq!(format_limit(&700), "700 bytes");
    }

    #[test]
    fn test_column_messages_list_required_set() {
        let err = IntakeError::MissingColumns {
            missing: vec!["Pressure".into()],
            required: vec!["Equipment Name".into(), "Pressure".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing columns: Pressure. Required columns: Equipment Name, Pressure"
        );
    }

    #[test]
    fn test_blank_column_name_is_readable() {
        let err = IntakeError::UnexpectedColumns {
            unexpected: vec!["".into()],
            allowed: vec!["Type".into(), "Pressure".into()],
        };
        assert_eq!(
            err.to_string(),
            "Unexpected columns: (blank). Allowed columns: Type, Pressure"
        );
    }

    #[test]
    fn test_row_list_formatting() {
        let err = IntakeError::InvalidNumeric {
            column: "Flowrate".into(),
            rows: vec![2, 4],
        };
        assert_eq!(
            err.to_string(),
            "Invalid numeric value in column \"Flowrate\" at row(s): 2, 4"
        );
    }
}
