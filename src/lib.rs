// src/lib.rs
//! Client-side intake for chemical-equipment CSV uploads.
//!
//! - [`intake`]: validate a picked file and build a bounded preview before
//!   anything is sent, plus the last-selection-wins [`intake::IntakeSession`].
//! - [`client`]: typed access to the analytics API (upload, history,
//!   visualization, comparison, PDF reports).
//! - [`config`]: limits and API settings from YAML and the environment.

pub mod client;
pub mod config;
pub mod intake;
pub mod schema;

pub use client::{ApiClient, ApiConfig, SubmitError};
pub use config::{AppConfig, IntakeConfig};
pub use intake::{validate, IntakeError, ParsedPreview, RawFile, ValidationOutcome};
pub use schema::SchemaSpec;
