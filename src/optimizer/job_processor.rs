//! # Job Processor Module
//!
//! Worker per l'elaborazione di un singolo file:
//! lettura → catena di backend → confronto dimensioni → scrittura.
//!
//! Ogni errore viene catturato nel `JobOutcome`, nessun errore esce dal job.
//! Se l'output dei backend non è strettamente più piccolo viene scritto
//! l'originale: il file scritto non è mai più grande dell'input.

use crate::backend::TransformChain;
use crate::config::Config;
use crate::error::{JobError, TransformError};
use crate::file_manager::{FileKind, FileManager, ReadResult};
use crate::job::{backend_names, JobOutcome, JobSpec};
use crate::optimizer::chain_resolver::ResolvedChain;
use crate::optimizer::path_resolver::PathResolver;
use std::time::Duration;
use tracing::debug;

/// Runs the pipeline for one file
#[derive(Debug, Clone)]
pub struct JobProcessor {
    max_file_size: u64,
    transform_timeout: Duration,
    dry_run: bool,
}

impl JobProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            max_file_size: config.max_file_size,
            transform_timeout: config.transform_timeout(),
            dry_run: config.dry_run,
        }
    }

    /// Processa un singolo file
    pub async fn process(&self, job: &JobSpec, kind: FileKind, resolved: &ResolvedChain) -> JobOutcome {
        let original = match self.read_source(job).await {
            Ok(data) => data,
            Err(e) => return JobOutcome::failed(job.clone(), kind, 0, e),
        };
        let original_size = original.len() as u64;

        let backends = backend_names(&resolved.backends);
        let fail = |error: JobError| JobOutcome {
            backends: Vec::clone(&backends),
            ..JobOutcome::failed(job.clone(), kind, original_size, error)
        };

        let transformed = match self.apply_chain(&resolved.chain, original.clone()).await {
            Ok(data) => data,
            Err(e) => return fail(e.into()),
        };

        // never regress: keep the original unless strictly smaller
        let output = if transformed.len() < original.len() {
            transformed
        } else {
            debug!(
                "No improvement for {} ({} -> {} bytes), keeping original",
                job.source.display(),
                original.len(),
                transformed.len()
            );
            original
        };
        let final_size = output.len() as u64;

        let written = if self.dry_run {
            debug!("Dry run: would write {} bytes to {}", final_size, job.dest.display());
            false
        } else {
            if let Err(e) = Self::write_dest(job, output).await {
                return fail(e);
            }
            true
        };

        JobOutcome {
            job: job.clone(),
            kind,
            original_size,
            final_size,
            written,
            backends,
            error: None,
        }
    }

    async fn read_source(&self, job: &JobSpec) -> Result<Vec<u8>, JobError> {
        match FileManager::read_limited(&job.source, self.max_file_size).await {
            Ok(ReadResult::Data(data)) => Ok(data),
            Ok(ReadResult::TooLarge(size)) => Err(JobError::TooLarge {
                path: job.source.clone(),
                size,
                limit: self.max_file_size,
            }),
            Err(e) => Err(JobError::read(&job.source, e)),
        }
    }

    /// Threads the bytes through every backend, each bounded by the timeout
    async fn apply_chain(&self, chain: &TransformChain, input: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        let mut data = input;

        for transform in chain {
            let before = data.len();
            let start_time = std::time::Instant::now();

            data = tokio::time::timeout(self.transform_timeout, transform.apply(data))
                .await
                .map_err(|_| TransformError::Timeout {
                    backend: transform.name().to_string(),
                    timeout: self.transform_timeout,
                })??;

            debug!(
                "{}: {} -> {} bytes in {:?}",
                transform.name(),
                before,
                data.len(),
                start_time.elapsed()
            );
        }

        Ok(data)
    }

    async fn write_dest(job: &JobSpec, data: Vec<u8>) -> Result<(), JobError> {
        PathResolver::ensure_parent_dirs(&job.dest).await?;
        FileManager::write_atomic(&job.dest, data)
            .await
            .map_err(|e| JobError::write(&job.dest, e))
    }
}
