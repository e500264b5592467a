// src/intake/mod.rs
//! CSV intake: check a user-selected file before it is ever transmitted.
//!
//! [`validate`] is a pure function of the file and the [`IntakeConfig`]. It
//! never touches the network and never panics; every failure comes back as
//! [`ValidationOutcome::Rejected`].

pub mod content;
pub mod error;
mod parse;
pub mod session;

use anyhow::{Context, Result};
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path, sync::Arc};
use tracing::{debug, info};

use crate::{config::IntakeConfig, schema::diff_headers};

pub use error::IntakeError;
pub use session::{IntakeSession, IntakeState, Ticket};

/// A file picked by the user. Immutable once built; re-selecting a file
/// means building a new `RawFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    name: String,
    size_bytes: u64,
    content: Arc<[u8]>,
}

impl RawFile {
    /// `size_bytes` is what the picker reported, which is what the size
    /// limit is checked against.
    pub fn new(name: impl Into<String>, size_bytes: u64, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            content: content.into(),
        }
    }

    pub fn from_bytes(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content: Vec<u8> = content.into();
        let size_bytes = content.len() as u64;
        Self::new(name, size_bytes, content)
    }

    /// Read a file from disk. The name is the path's final component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_bytes(name, content))
    }

    /// Async variant of [`RawFile::from_path`].
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_bytes(name, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// One previewed data row: column name → raw field text.
pub type PreviewRow = BTreeMap<String, String>;

/// Bounded sample of an accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPreview {
    /// Header columns in file order.
    pub columns: Vec<String>,
    /// At most `max_preview_rows` rows, values uncoerced.
    pub rows: Vec<PreviewRow>,
}

impl ParsedPreview {
    /// Values of `row` in column order, for tabular display.
    pub fn ordered_values<'a>(&'a self, row: &'a PreviewRow) -> impl Iterator<Item = &'a str> {
        self.columns
            .iter()
            .map(move |c| row.get(c).map(String::as_str).unwrap_or(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted(ParsedPreview),
    Rejected(IntakeError),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    pub fn preview(&self) -> Option<&ParsedPreview> {
        match self {
            ValidationOutcome::Accepted(p) => Some(p),
            ValidationOutcome::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<&IntakeError> {
        match self {
            ValidationOutcome::Accepted(_) => None,
            ValidationOutcome::Rejected(e) => Some(e),
        }
    }
}

impl From<Result<ParsedPreview, IntakeError>> for ValidationOutcome {
    fn from(res: Result<ParsedPreview, IntakeError>) -> Self {
        match res {
            Ok(p) => ValidationOutcome::Accepted(p),
            Err(e) => ValidationOutcome::Rejected(e),
        }
    }
}

/// Check `file` against `config` and build its preview.
#[tracing::instrument(
    level = "debug",
    skip(file, config),
    fields(name = %file.name(), size = file.size_bytes())
)]
pub fn validate(file: &RawFile, config: &IntakeConfig) -> ValidationOutcome {
    let outcome = ValidationOutcome::from(run_checks(file, config));
    match &outcome {
        ValidationOutcome::Accepted(p) => {
            debug!(rows = p.rows.len(), "accepted");
        }
        ValidationOutcome::Rejected(e) => {
            info!(kind = e.kind(), reason = %e, "rejected {}", file.name());
        }
    }
    outcome
}

fn run_checks(file: &RawFile, config: &IntakeConfig) -> Result<ParsedPreview, IntakeError> {
    // ─── 1) extension ────────────────────────────────────────────────
    if !file.name().to_lowercase().ends_with(".csv") {
        return Err(IntakeError::InvalidExtension {
            name: file.name().to_string(),
        });
    }

    // ─── 2) size ─────────────────────────────────────────────────────
    if file.size_bytes() > config.max_file_size_bytes {
        return Err(IntakeError::FileTooLarge {
            size_bytes: file.size_bytes(),
            limit_bytes: config.max_file_size_bytes,
        });
    }

    // ─── 3) parse a bounded sample ───────────────────────────────────
    // at least one row is always read so emptiness is known even when
    // previews are disabled
    let sample = parse::read_sample(file.content(), config.max_preview_rows.max(1))?;

    // ─── 4) emptiness ────────────────────────────────────────────────
    if sample.rows.is_empty() {
        return Err(IntakeError::EmptyFile);
    }

    // ─── 5) schema ───────────────────────────────────────────────────
    let schema = &config.schema;
    let diff = diff_headers(schema, &sample.headers);
    if !diff.missing.is_empty() {
        return Err(IntakeError::MissingColumns {
            missing: diff.missing,
            required: schema.required_columns.clone(),
        });
    }
    if !diff.unexpected.is_empty() {
        return Err(IntakeError::UnexpectedColumns {
            unexpected: diff.unexpected,
            allowed: schema.required_columns.clone(),
        });
    }

    // ─── 6) optional full-file numeric scan ──────────────────────────
    if config.check_numeric {
        content::check_numeric_columns(file.content(), schema)?;
    }

    // ─── 7) preview ──────────────────────────────────────────────────
    let rows = sample
        .rows
        .into_iter()
        .take(config.max_preview_rows)
        .map(|fields| {
            sample
                .headers
                .iter()
                .cloned()
                .zip(fields)
                .collect::<PreviewRow>()
        })
        .collect();

    Ok(ParsedPreview {
        columns: sample.headers,
        rows,
    })
}
