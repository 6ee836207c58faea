//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e le statistiche di ottimizzazione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar `indicatif` aggiornata ad ogni file completato
//! - `OptimizationStats`: statistiche cumulative calcolate dagli outcome del batch
//!
//! ## Statistiche tracciate:
//! - **files_processed**: Totale file elaborati
//! - **files_optimized**: File effettivamente ridotti
//! - **files_unchanged**: File copiati invariati (nessun miglioramento)
//! - **total_bytes_saved**: Byte totali risparmiati
//! - **total_original_size**: Dimensione totale file originali
//! - **errors**: Numero di errori durante processing
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 30/50 (60%) photo.png: 42.1% saved
//! ```

use crate::file_manager::FileManager;
use crate::job::{JobOutcome, OutcomeStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for a batch
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        // the template is a constant, a parse failure falls back to the default bar
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for optimization results
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_unchanged: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
    pub errors: usize,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        let mut stats = Self::new();
        for outcome in outcomes {
            stats.add(outcome);
        }
        stats
    }

    pub fn add(&mut self, outcome: &JobOutcome) {
        match outcome.status() {
            OutcomeStatus::Improved => self.add_optimized(outcome.original_size, outcome.final_size),
            OutcomeStatus::NoImprovement => self.add_unchanged(outcome.original_size),
            OutcomeStatus::Error => self.add_error(),
        }
    }

    pub fn add_optimized(&mut self, original_size: u64, new_size: u64) {
        self.files_processed += 1;
        self.files_optimized += 1;
        self.total_original_size += original_size;
        self.total_bytes_saved += original_size.saturating_sub(new_size);
    }

    pub fn add_unchanged(&mut self, original_size: u64) {
        self.files_processed += 1;
        self.files_unchanged += 1;
        self.total_original_size += original_size;
    }

    pub fn add_error(&mut self) {
        self.files_processed += 1;
        self.errors += 1;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        if self.total_original_size > 0 {
            (self.total_bytes_saved as f64 / self.total_original_size as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Optimized: {} | Unchanged: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_unchanged,
            self.errors,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut stats = OptimizationStats::new();
        stats.add_optimized(1000, 400);
        stats.add_unchanged(1000);
        stats.add_error();

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_optimized, 1);
        assert_eq!(stats.files_unchanged, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total_bytes_saved, 600);
        assert_eq!(stats.overall_reduction_percent(), 30.0);
        assert!(stats.format_summary().contains("Errors: 1"));
    }
}
