//! # Image Batch Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore per batch, job e backend
//! - `backend`: Backend di compressione esterni e trait `Transform`
//! - `tool_resolver`: Ricerca degli eseguibili dei backend
//! - `file_manager`: Operazioni sui file, discovery e scrittura atomica
//! - `job`: Job, outcome ed eventi
//! - `optimizer`: Orchestratore principale del processo
//! - `progress`: Progress bar e statistiche
//! - `json_output`: Output JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use image_batch_optimizer::{BatchCoordinator, Config, JobSpec, ProgressTracker, ToolProvider};
//!
//! let mut coordinator = BatchCoordinator::new(
//!     Config::default(),
//!     Arc::new(ToolProvider::default()),
//!     Arc::new(ProgressTracker::new()),
//! )?;
//! let result = coordinator.run_batch(vec![JobSpec::new("in.png", "out.png")]).await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod job;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod tool_resolver;
pub mod utils;

#[cfg(test)]
mod testing;

pub use backend::{BackendId, BackendProvider, ExternalTool, ToolProvider, Transform, TransformChain};
pub use config::{BackendConfig, BackendSetting, Config, ToolOptions};
pub use error::{ErrorKind, JobError, OptimizeError, TransformError};
pub use file_manager::{FileKind, FileManager};
pub use job::{BatchResult, JobEvent, JobOutcome, JobSpec, OutcomeStatus};
pub use json_output::JsonReporter;
pub use optimizer::{BatchCoordinator, PathResolver, ProgressTracker, Reporter};
