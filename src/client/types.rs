// src/client/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-side record created from one accepted upload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DatasetSummary {
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    /// Equipment type → row count.
    #[serde(default)]
    pub type_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Parallel label/value arrays, ready for a bar or pie chart.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

impl ChartSeries {
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().copied())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Visualization {
    pub type_distribution: ChartSeries,
    pub averages: ChartSeries,
}

/// Differences of the averages, dataset 2 minus dataset 1.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct AverageDiff {
    pub flowrate_diff: f64,
    pub pressure_diff: f64,
    pub temperature_diff: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Comparison {
    pub dataset1: DatasetSummary,
    pub dataset2: DatasetSummary,
    pub comparison: AverageDiff,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompareRequest {
    pub dataset1: i64,
    pub dataset2: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Shape of a non-2xx JSON body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
