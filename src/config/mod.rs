// src/config/mod.rs
//! Runtime configuration: intake limits plus API client settings.
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables. Every field has a default, so an empty file (or none) works.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::{debug, warn};

use crate::{client::ApiConfig, schema::SchemaSpec};

pub const DEFAULT_MAX_PREVIEW_ROWS: usize = 5;
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

pub const ENV_API_URL: &str = "API_URL";
pub const ENV_MAX_PREVIEW_ROWS: &str = "INTAKE_MAX_PREVIEW_ROWS";
pub const ENV_MAX_FILE_SIZE_BYTES: &str = "INTAKE_MAX_FILE_SIZE_BYTES";

/// Limits and schema applied by [`crate::intake::validate`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct IntakeConfig {
    /// Data rows kept in a preview. Not a processing limit.
    pub max_preview_rows: usize,
    pub max_file_size_bytes: u64,
    #[serde(flatten)]
    pub schema: SchemaSpec,
    /// Scan every row of the numeric columns before accepting.
    pub check_numeric: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_preview_rows: DEFAULT_MAX_PREVIEW_ROWS,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            schema: SchemaSpec::equipment(),
            check_numeric: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub intake: IntakeConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    /// Read `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok());
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Unparseable numbers are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            debug!(%url, "api base url from environment");
            self.api.base_url = url;
        }
        if let Some(raw) = lookup(ENV_MAX_PREVIEW_ROWS) {
            match raw.trim().parse() {
                Ok(n) => self.intake.max_preview_rows = n,
                Err(_) => warn!(key = ENV_MAX_PREVIEW_ROWS, value = %raw, "ignoring bad override"),
            }
        }
        if let Some(raw) = lookup(ENV_MAX_FILE_SIZE_BYTES) {
            match raw.trim().parse() {
                Ok(n) => self.intake.max_file_size_bytes = n,
                Err(_) => {
                    warn!(key = ENV_MAX_FILE_SIZE_BYTES, value = %raw, "ignoring bad override")
                }
            }
        }
    }
}
