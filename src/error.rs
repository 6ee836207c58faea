//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - `OptimizeError`: errori che impediscono l'avvio del batch (config, tool)
//! - `JobError`: errori locali ad un singolo file, mai propagati oltre il job
//! - `TransformError`: errori di un singolo backend di compressione
//!
//! ## Categorie di errori per job:
//! - `Read`: file sorgente mancante, illeggibile o troppo grande
//! - `Transform`: backend fallito o andato in timeout
//! - `Directory`: impossibile creare la directory di destinazione
//! - `Write`: impossibile scrivere il file di destinazione
//! - `Cancelled`: batch interrotto prima che il job partisse
//!
//! ## Esempio:
//! ```rust,ignore
//! if config.workers == 0 {
//!     return Err(OptimizeError::Validation("workers must be > 0".to_string()));
//! }
//! ```

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that stop a batch before any file is touched
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure of a single backend invocation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("{backend} failed: {message}")]
    Failed { backend: String, message: String },

    #[error("{backend} timed out after {timeout:?}")]
    Timeout { backend: String, timeout: Duration },

    #[error("{backend} is unavailable: {message}")]
    Unavailable { backend: String, message: String },
}

impl TransformError {
    pub fn failed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Coarse error category attached to every failed job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Read,
    Transform,
    Directory,
    Write,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Read => "ReadError",
            Self::Transform => "TransformError",
            Self::Directory => "DirectoryError",
            Self::Write => "WriteError",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Job-local error. Captured in the job outcome, never raised past the job.
#[derive(thiserror::Error, Debug, Clone)]
pub enum JobError {
    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("{path} is {size} bytes, above the {limit} bytes limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("cannot create directory {path}: {message}")]
    Directory { path: PathBuf, message: String },

    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("batch cancelled before the job started")]
    Cancelled,
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Read { .. } | Self::TooLarge { .. } => ErrorKind::Read,
            Self::Transform(_) => ErrorKind::Transform,
            Self::Directory { .. } => ErrorKind::Directory,
            Self::Write { .. } => ErrorKind::Write,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn read(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn directory(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Directory {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
