//! # Batch Coordinator
//!
//! Orchestratore principale: distribuisce i job su un pool di worker limitato
//! e raccoglie un `JobOutcome` per ogni file.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: la config viene validata alla creazione
//! 2. **Risoluzione catene**: una catena per ogni `FileKind` presente, poi congelata
//! 3. **Fan-out**: un task tokio per file, al massimo `workers` in parallelo
//!    (semaforo, finestra scorrevole: appena un job termina parte il successivo)
//! 4. **Reporting**: ogni job notifica il `Reporter` appena termina
//! 5. **Raccolta**: gli outcome sono restituiti nell'ordine di input
//!
//! ## Gestione errori:
//! - Errori dei singoli file non bloccano gli altri job
//! - Un panic in un task diventa un outcome di errore per quel solo file
//! - `run_batch` fallisce solo se il batch non può essere inizializzato
//!
//! ## Cancellazione:
//! - Dopo un segnale di stop i job non ancora partiti vengono marcati `Cancelled`
//! - I job in corso terminano normalmente (scrittura atomica)

use crate::backend::BackendProvider;
use crate::config::Config;
use crate::error::{JobError, TransformError};
use crate::file_manager::FileKind;
use crate::job::{BatchResult, JobOutcome, JobSpec};
use crate::optimizer::chain_resolver::ChainCache;
use crate::optimizer::job_processor::JobProcessor;
use crate::optimizer::progress_tracker::Reporter;
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

enum Slot {
    Running(JobSpec, FileKind, JoinHandle<JobOutcome>),
    Done(JobOutcome),
}

/// Runs a batch of jobs with bounded parallelism
pub struct BatchCoordinator {
    config: Arc<Config>,
    provider: Arc<dyn BackendProvider>,
    reporter: Arc<dyn Reporter>,
    stop_receiver: Option<broadcast::Receiver<()>>,
    stopped: bool,
}

impl BatchCoordinator {
    /// Crea il coordinatore, fallisce se la config non è valida
    pub fn new(config: Config, provider: Arc<dyn BackendProvider>, reporter: Arc<dyn Reporter>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
            provider,
            reporter,
            stop_receiver: None,
            stopped: false,
        })
    }

    /// Stop jobs that have not started yet when a signal arrives on `stop_receiver`
    pub fn with_cancellation(mut self, stop_receiver: broadcast::Receiver<()>) -> Self {
        self.stop_receiver = Some(stop_receiver);
        self
    }

    pub fn create_cancellation_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
        broadcast::channel(1)
    }

    /// Checks if a stop signal has been received. Once stopped, stays stopped.
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if let Some(ref mut receiver) = self.stop_receiver {
            match receiver.try_recv() {
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    info!("Stop signal received, pending files will be skipped");
                    self.stopped = true;
                }
                // no signal yet, or sender dropped
                Err(broadcast::error::TryRecvError::Empty) | Err(broadcast::error::TryRecvError::Closed) => {}
            }
        }
        self.stopped
    }

    /// Esegue il batch
    pub async fn run_batch(&mut self, jobs: Vec<JobSpec>) -> Result<BatchResult> {
        let start_time = Instant::now();

        let kinds: Vec<FileKind> = jobs.iter().map(|job| FileKind::detect(&job.source)).collect();
        self.log_configuration(&kinds);

        let chains = Arc::new(ChainCache::build(
            kinds.iter().copied(),
            &self.config.backends,
            self.provider.as_ref(),
        ));
        if !chains.is_empty() {
            debug!("Resolved chains for {} file kinds", chains.len());
        }

        self.reporter.batch_started(jobs.len());

        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let processor = JobProcessor::new(&self.config);
        let mut slots = Vec::with_capacity(jobs.len());

        for (job, kind) in jobs.into_iter().zip(kinds) {
            let permit = semaphore.clone().acquire_owned().await?;

            if self.should_stop() {
                let outcome = JobOutcome::failed(job, kind, 0, JobError::Cancelled);
                self.reporter.job_finished(&outcome.event());
                slots.push(Slot::Done(outcome));
                continue;
            }

            let chains = chains.clone();
            let processor = processor.clone();
            let reporter = self.reporter.clone();
            let task_job = job.clone();

            let task = tokio::spawn(async move {
                let _permit = permit;

                let outcome = match chains.get(kind) {
                    Ok(resolved) => processor.process(&task_job, kind, &resolved).await,
                    Err(e) => JobOutcome::failed(task_job, kind, 0, e.into()),
                };

                reporter.job_finished(&outcome.event());
                outcome
            });

            slots.push(Slot::Running(job, kind, task));
        }

        let mut outcomes = Vec::with_capacity(slots.len());
        for slot in slots {
            let outcome = match slot {
                Slot::Done(outcome) => outcome,
                Slot::Running(job, kind, task) => match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Worker for {} did not complete: {}", job.source.display(), e);
                        let outcome = JobOutcome::failed(
                            job,
                            kind,
                            0,
                            TransformError::failed("worker", e.to_string()).into(),
                        );
                        self.reporter.job_finished(&outcome.event());
                        outcome
                    }
                },
            };
            outcomes.push(outcome);
        }

        let result = BatchResult::new(outcomes, start_time.elapsed());
        debug!("Batch finished in {:?}, any_failed={}", result.elapsed, result.any_failed);
        self.reporter.batch_finished(&result);

        Ok(result)
    }

    /// Logga configurazione e distribuzione dei file per tipo
    fn log_configuration(&self, kinds: &[FileKind]) {
        if self.config.json_output {
            return;
        }

        let enabled: Vec<&str> = self.config.backends.enabled().iter().map(|id| id.name()).collect();
        info!("Backends enabled: {}", enabled.join(", "));
        info!("Workers: {}", self.config.workers);
        if self.config.dry_run {
            info!("Dry run mode: No files will be written");
        }

        let mut distribution: BTreeMap<&str, usize> = BTreeMap::new();
        for kind in kinds {
            *distribution.entry(kind.description()).or_default() += 1;
        }
        for (kind, count) in distribution {
            info!("  • {}: {} files", kind, count);
        }
    }
}
