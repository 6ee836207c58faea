//! # Job Data Model
//!
//! - `JobSpec`: coppia sorgente/destinazione, immutabile
//! - `JobOutcome`: risultato di un job (successo o errore), mai un panic
//! - `JobEvent`: evento strutturato inviato al reporter per ogni job completato
//! - `BatchResult`: aggregato di tutti gli outcome

use crate::backend::BackendId;
use crate::error::{ErrorKind, JobError};
use crate::file_manager::{FileKind, FileManager};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// One input file and where its result goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl JobSpec {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }

    /// Label used in reports
    pub fn label(&self) -> String {
        self.source.display().to_string()
    }
}

/// How a job ended, as seen by the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Improved,
    NoImprovement,
    Error,
}

/// Result of processing one file
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: JobSpec,
    pub kind: FileKind,
    pub original_size: u64,
    pub final_size: u64,
    pub written: bool,
    pub backends: Vec<String>,
    pub error: Option<JobError>,
}

impl JobOutcome {
    pub fn failed(job: JobSpec, kind: FileKind, original_size: u64, error: JobError) -> Self {
        Self {
            job,
            kind,
            original_size,
            final_size: original_size,
            written: false,
            backends: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Bytes saved, negative never happens for a successful job
    pub fn diff(&self) -> i64 {
        self.original_size as i64 - self.final_size as i64
    }

    pub fn diff_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.original_size, self.final_size)
    }

    pub fn status(&self) -> OutcomeStatus {
        if self.error.is_some() {
            OutcomeStatus::Error
        } else if self.diff() > 0 {
            OutcomeStatus::Improved
        } else {
            OutcomeStatus::NoImprovement
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(JobError::kind)
    }

    pub fn event(&self) -> JobEvent {
        JobEvent {
            source_label: self.job.label(),
            status: self.status(),
            original_size: self.original_size,
            final_size: self.final_size,
            reduced_bytes: self.diff(),
            reduced_percent: self.diff_percent(),
            error_kind: self.error_kind(),
            error: self.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Structured per-job report, formatting is left to the reporter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobEvent {
    pub source_label: String,
    pub status: OutcomeStatus,
    pub original_size: u64,
    pub final_size: u64,
    pub reduced_bytes: i64,
    pub reduced_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every outcome of a batch, in input order
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub outcomes: Vec<JobOutcome>,
    pub any_failed: bool,
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn new(outcomes: Vec<JobOutcome>, elapsed: Duration) -> Self {
        let any_failed = outcomes.iter().any(|o| !o.is_success());
        Self {
            outcomes,
            any_failed,
            elapsed,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Names recorded in outcomes for a resolved backend list
pub(crate) fn backend_names(backends: &[BackendId]) -> Vec<String> {
    backends.iter().map(|id| id.name().to_string()).collect()
}
