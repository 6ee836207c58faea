//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico
//! (una riga JSON per evento su stdout).
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch
//! - `file_complete`: Fine elaborazione di un file (successo o errore)
//! - `complete`: Fine batch con statistiche finali
//! - `error`: Errore che impedisce l'avvio del batch

use crate::config::Config;
use crate::job::{BatchResult, JobEvent};
use crate::optimizer::Reporter;
use crate::progress::OptimizationStats;
use serde::Serialize;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del batch
    Start { total_files: usize, config: JsonConfig },

    /// Fine elaborazione di un file specifico
    FileComplete {
        #[serde(flatten)]
        event: JobEvent,
    },

    /// Batch completato
    Complete {
        files_processed: usize,
        files_optimized: usize,
        files_unchanged: usize,
        errors: usize,
        total_bytes_saved: u64,
        average_reduction: f64,
        duration_seconds: f64,
        any_failed: bool,
    },

    /// Errore generale
    Error { message: String },
}

/// Configurazione riportata nel messaggio `start`
#[derive(Debug, Serialize)]
pub struct JsonConfig {
    pub workers: usize,
    pub dry_run: bool,
    pub backends: Vec<&'static str>,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            workers: config.workers,
            dry_run: config.dry_run,
            backends: config.backends.enabled().iter().map(|id| id.name()).collect(),
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn complete(result: &BatchResult) -> Self {
        let stats = OptimizationStats::from_outcomes(&result.outcomes);
        Self::Complete {
            files_processed: stats.files_processed,
            files_optimized: stats.files_optimized,
            files_unchanged: stats.files_unchanged,
            errors: stats.errors,
            total_bytes_saved: stats.total_bytes_saved,
            average_reduction: stats.overall_reduction_percent(),
            duration_seconds: result.elapsed.as_secs_f64(),
            any_failed: result.any_failed,
        }
    }
}

/// Reporter che emette una riga JSON per ogni evento
pub struct JsonReporter {
    config: JsonConfig,
}

impl JsonReporter {
    pub fn new(config: &Config) -> Self {
        Self {
            config: JsonConfig::from(config),
        }
    }
}

impl Reporter for JsonReporter {
    fn batch_started(&self, total: usize) {
        JsonMessage::Start {
            total_files: total,
            config: JsonConfig {
                workers: self.config.workers,
                dry_run: self.config.dry_run,
                backends: self.config.backends.clone(),
            },
        }
        .emit();
    }

    fn job_finished(&self, event: &JobEvent) {
        JsonMessage::FileComplete { event: event.clone() }.emit();
    }

    fn batch_finished(&self, result: &BatchResult) {
        JsonMessage::complete(result).emit();
    }
}
