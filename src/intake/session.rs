// src/intake/session.rs
//! Per-selection intake state with last-selection-wins ordering.
//!
//! Every selection bumps a generation counter and hands back a [`Ticket`].
//! A validation result is applied only if its ticket is still the latest, so
//! a slow parse of a stale file can never overwrite a newer selection.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::{validate, IntakeError, ParsedPreview, RawFile, ValidationOutcome};
use crate::{
    client::{ApiClient, DatasetSummary, SubmitError},
    config::IntakeConfig,
};

/// Identifies one selection. Only the most recent ticket may update state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// What the UI shows for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeState {
    Idle,
    Validating { name: String },
    Accepted { name: String, preview: ParsedPreview },
    Rejected { name: String, error: IntakeError },
    Submitting { name: String },
    /// Post-submission failure (unauthorized, server error, transport).
    SubmitFailed { name: String, reason: String },
}

impl IntakeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeState::Idle => "Idle",
            IntakeState::Validating { .. } => "Validating",
            IntakeState::Accepted { .. } => "Accepted",
            IntakeState::Rejected { .. } => "Rejected",
            IntakeState::Submitting { .. } => "Submitting",
            IntakeState::SubmitFailed { .. } => "SubmitFailed",
        }
    }
}

#[derive(Debug)]
struct Inner {
    generation: u64,
    file: Option<RawFile>,
    state: IntakeState,
}

/// Shared handle to the intake state. Clones see the same state.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    config: Arc<IntakeConfig>,
    inner: Arc<Mutex<Inner>>,
}

impl IntakeSession {
    pub fn new(config: IntakeConfig) -> Self {
        Self {
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner {
                generation: 0,
                file: None,
                state: IntakeState::Idle,
            })),
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> IntakeState {
        self.lock().state.clone()
    }

    /// The file behind the current selection, if any.
    pub fn current_file(&self) -> Option<RawFile> {
        self.lock().file.clone()
    }

    /// Start a new selection. Any earlier preview or error is dropped and any
    /// in-flight validation becomes stale.
    pub fn select(&self, file: RawFile) -> Ticket {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = IntakeState::Validating {
            name: file.name().to_string(),
        };
        inner.file = Some(file);
        debug!(generation = inner.generation, "selection started");
        Ticket(inner.generation)
    }

    /// Drop the current selection and return to `Idle`.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.file = None;
        inner.state = IntakeState::Idle;
        debug!(generation = inner.generation, "selection cancelled");
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.lock().generation == ticket.0
    }

    /// Apply a validation result. Returns `false` (and changes nothing) when
    /// `ticket` has been superseded.
    pub fn complete(&self, ticket: Ticket, outcome: ValidationOutcome) -> bool {
        let mut inner = self.lock();
        if inner.generation != ticket.0 {
            debug!(
                stale = ticket.0,
                current = inner.generation,
                "discarding stale validation result"
            );
            return false;
        }
        let name = inner
            .file
            .as_ref()
            .map(|f| f.name().to_string())
            .unwrap_or_default();
        inner.state = match outcome {
            ValidationOutcome::Accepted(preview) => IntakeState::Accepted { name, preview },
            ValidationOutcome::Rejected(error) => IntakeState::Rejected { name, error },
        };
        true
    }

    /// Select `file` and validate it synchronously.
    pub fn select_and_validate(&self, file: RawFile) -> IntakeState {
        let ticket = self.select(file.clone());
        let outcome = validate(&file, &self.config);
        self.complete(ticket, outcome);
        self.state()
    }

    /// Select `file` and validate it on the blocking pool. Returns whether the
    /// result was applied; `false` means a newer selection won.
    pub async fn validate_in_background(&self, file: RawFile) -> Result<bool> {
        let ticket = self.select(file.clone());
        let config = Arc::clone(&self.config);
        let outcome = tokio::task::spawn_blocking(move || validate(&file, &config))
            .await
            .context("validation task failed")?;
        Ok(self.complete(ticket, outcome))
    }

    /// Move an accepted (or previously failed) selection to `Submitting`.
    /// Returns the file to send and the ticket to finish with, or `None` when
    /// nothing is accepted.
    pub fn begin_submit(&self) -> Option<(Ticket, RawFile)> {
        let mut inner = self.lock();
        let name = match &inner.state {
            IntakeState::Accepted { name, .. } | IntakeState::SubmitFailed { name, .. } => {
                name.clone()
            }
            _ => return None,
        };
        let file = inner.file.clone()?;
        inner.state = IntakeState::Submitting { name };
        Some((Ticket(inner.generation), file))
    }

    /// Record how a submission ended. Success clears the selection back to
    /// `Idle`; failure keeps it so the user can retry. Returns `false` if the
    /// selection changed while the upload was in flight.
    pub fn finish_submit(
        &self,
        ticket: Ticket,
        result: &Result<DatasetSummary, SubmitError>,
    ) -> bool {
        let mut inner = self.lock();
        if inner.generation != ticket.0 {
            return false;
        }
        let name = inner
            .file
            .as_ref()
            .map(|f| f.name().to_string())
            .unwrap_or_default();
        match result {
            Ok(summary) => {
                info!(id = summary.id, %name, "submission finished");
                inner.generation += 1;
                inner.file = None;
                inner.state = IntakeState::Idle;
            }
            Err(err) => {
                warn!(%name, "submission failed: {}", err);
                inner.state = IntakeState::SubmitFailed {
                    name,
                    reason: err.to_string(),
                };
            }
        }
        true
    }

    /// Submit the accepted selection through `client`.
    pub async fn submit(&self, client: &ApiClient) -> Result<DatasetSummary, SubmitError> {
        let (ticket, file) = self.begin_submit().ok_or(SubmitError::NotAccepted)?;
        let result = client.upload(&file).await;
        self.finish_submit(ticket, &result);
        result
    }
}
