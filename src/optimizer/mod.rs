//! # Optimizer Module
//!
//! Separa le responsabilità dell'ottimizzazione in sottomoduli:
//! - `batch_coordinator`: Orchestratore principale (pool di worker limitato)
//! - `job_processor`: Worker per singoli file
//! - `chain_resolver`: Catena di backend per ogni tipo di file
//! - `progress_tracker`: Notifica degli eventi (console)
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_coordinator;
pub mod chain_resolver;
pub mod job_processor;
pub mod path_resolver;
pub mod progress_tracker;

pub use batch_coordinator::BatchCoordinator;
pub use chain_resolver::{ChainCache, ResolvedChain};
pub use job_processor::JobProcessor;
pub use path_resolver::PathResolver;
pub use progress_tracker::{ProgressTracker, Reporter};
