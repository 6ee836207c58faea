//! # Progress Tracking Module
//!
//! `Reporter` è il punto in cui il coordinatore notifica l'osservatore esterno:
//! un evento per ogni job completato, appena completato.
//! `ProgressTracker` è l'implementazione per console (progress bar + log).

use crate::file_manager::FileManager;
use crate::job::{BatchResult, JobEvent, OutcomeStatus};
use crate::progress::{OptimizationStats, ProgressManager};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Observer notified as the batch progresses
pub trait Reporter: Send + Sync {
    fn batch_started(&self, total: usize);

    /// Called once per job, in completion order
    fn job_finished(&self, event: &JobEvent);

    fn batch_finished(&self, result: &BatchResult);
}

/// Console reporter: progress bar plus one log line per file
#[derive(Default)]
pub struct ProgressTracker {
    progress: OnceLock<ProgressManager>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Human readable line for a completed job
    pub fn format_event(event: &JobEvent) -> String {
        match event.status {
            OutcomeStatus::Improved => format!(
                "[OK] {} -> before={} after={} reduced={} ({}%)",
                event.source_label,
                FileManager::format_size(event.original_size),
                FileManager::format_size(event.final_size),
                FileManager::format_size(event.reduced_bytes.max(0) as u64),
                event.reduced_percent
            ),
            OutcomeStatus::NoImprovement => format!(
                "[SKIP] {} -> Cannot improve upon {}",
                event.source_label,
                FileManager::format_size(event.original_size)
            ),
            OutcomeStatus::Error => format!(
                "[ERROR] {} -> {}",
                event.source_label,
                event.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

impl Reporter for ProgressTracker {
    fn batch_started(&self, total: usize) {
        self.progress.get_or_init(|| ProgressManager::new(total as u64));
        info!("Processing {} files", total);
    }

    fn job_finished(&self, event: &JobEvent) {
        let line = Self::format_event(event);
        match event.status {
            OutcomeStatus::Error => warn!("{}", line),
            _ => info!("{}", line),
        }

        if let Some(progress) = self.progress.get() {
            progress.update(&event.source_label);
        }
    }

    fn batch_finished(&self, result: &BatchResult) {
        let stats = OptimizationStats::from_outcomes(&result.outcomes);
        if let Some(progress) = self.progress.get() {
            progress.finish(&stats.format_summary());
        }

        info!("=== Optimization Complete ===");
        info!("Files processed: {}", stats.files_processed);
        info!("Files optimized: {}", stats.files_optimized);
        info!("Files unchanged: {}", stats.files_unchanged);
        info!("Errors: {}", stats.errors);
        info!("Bytes saved: {}", FileManager::format_size(stats.total_bytes_saved));
        info!("Average reduction: {:.2}%", stats.overall_reduction_percent());
        info!("Elapsed: {:.2}s", result.elapsed.as_secs_f64());

        for failed in result.failures() {
            if let Some(error) = &failed.error {
                warn!("{} failed ({}): {}", failed.job.label(), error.kind(), error);
            }
        }
    }
}
