// src/schema/types.rs

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Column headers every equipment upload must carry, in canonical order.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Equipment Name",
    "Type",
    "Flowrate",
    "Pressure",
    "Temperature",
];

/// Subset of [`REQUIRED_COLUMNS`] whose values must parse as numbers.
pub const NUMERIC_COLUMNS: &[&str] = &["Flowrate", "Pressure", "Temperature"];

static EQUIPMENT_SCHEMA: Lazy<SchemaSpec> = Lazy::new(|| SchemaSpec {
    required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
    numeric_columns: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
});

/// The set of columns an upload is checked against.
///
/// `required_columns` keeps its canonical order for messages, but header
/// comparison treats it as a set: column order in a file is not significant.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
#[serde(default)]
pub struct SchemaSpec {
    pub required_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
}

impl SchemaSpec {
    pub fn new<R, N>(required: R, numeric: N) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            required_columns: required.into_iter().map(Into::into).collect(),
            numeric_columns: numeric.into_iter().map(Into::into).collect(),
        }
    }

    /// The chemical-equipment schema: name, type, flowrate, pressure, temperature.
    pub fn equipment() -> Self {
        EQUIPMENT_SCHEMA.clone()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.required_columns.iter().any(|c| c == column)
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == column)
    }
}

impl Default for SchemaSpec {
    fn default() -> Self {
        Self::equipment()
    }
}
