//! # Image Batch Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente
//! - Creazione della configurazione e avvio del batch
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (input, output, backend, workers, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica la config JSON (se presente) e applica gli override da CLI
//! 4. Scopre i file e calcola un job per ognuno
//! 5. Avvia il `BatchCoordinator`, Ctrl-C interrompe i job non ancora partiti
//!
//! Exit code 1 se almeno un file è fallito.
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-optimizer ./assets --output ./dist --enable optipng --disable zopflipng --workers 8
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use image_batch_optimizer::json_output::JsonMessage;
use image_batch_optimizer::{
    BackendId, BackendSetting, BatchCoordinator, Config, FileManager, JsonReporter, OptimizeError,
    PathResolver, ProgressTracker, Reporter, ToolProvider,
};

#[derive(Parser)]
#[command(name = "image-optimizer")]
#[command(about = "Optimize images with external compressors, never making a file bigger")]
struct Args {
    /// Image file or directory containing images to optimize
    input: PathBuf,

    /// Output directory for optimized files (if not specified, replace originals in place)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable a backend (repeatable)
    #[arg(long, value_enum)]
    enable: Vec<BackendId>,

    /// Disable a backend (repeatable)
    #[arg(long, value_enum)]
    disable: Vec<BackendId>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Timeout for a single backend invocation, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Dry run - compute savings without writing files
    #[arg(long)]
    dry_run: bool,

    /// Output progress and results as JSON lines
    #[arg(long)]
    json: bool,

    /// Check that enabled backends are installed, then exit
    #[arg(long)]
    check_tools: bool,

    /// Write the effective configuration to this file, then exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    let json = args.json;
    match run(args).await {
        Ok(any_failed) => {
            if any_failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            if json {
                JsonMessage::Error { message: e.to_string() }.emit();
            }
            Err(e)
        }
    }
}

/// Logs go to stderr so that stdout stays clean for JSON output
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Returns whether any file failed
async fn run(args: Args) -> Result<bool> {
    let config = build_config(&args).await?;

    if let Some(path) = &args.save_config {
        config.save_to_file(path).await?;
        info!("Configuration written to {}", path.display());
        return Ok(false);
    }

    let provider = ToolProvider::default();
    let missing = provider.missing(&config.backends.enabled());
    for id in &missing {
        warn!("Backend {} is enabled but '{}' was not found", id, id.program());
    }
    if args.check_tools {
        if missing.is_empty() {
            info!("All enabled backends are available");
            return Ok(false);
        }
        let names: Vec<&str> = missing.iter().map(|id| id.program()).collect();
        return Err(OptimizeError::MissingDependency(names.join(", ")).into());
    }

    if !args.input.exists() {
        return Err(OptimizeError::Validation(format!("Input does not exist: {}", args.input.display())).into());
    }
    if !args.input.is_dir() && !args.input.is_file() {
        return Err(OptimizeError::Validation(format!(
            "Input is neither a directory nor a regular file: {}",
            args.input.display()
        ))
        .into());
    }
    if let Some(output_dir) = &args.output {
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(OptimizeError::Validation(format!(
                "Output path is not a directory: {}",
                output_dir.display()
            ))
            .into());
        }
    }

    let (files, base_dir) = discover(&args.input)?;
    if files.is_empty() {
        info!("No image files found in {}", args.input.display());
    }
    let jobs = PathResolver::job_specs(files, &base_dir, args.output.as_deref());

    let reporter: Arc<dyn Reporter> = if config.json_output {
        Arc::new(JsonReporter::new(&config))
    } else {
        Arc::new(ProgressTracker::new())
    };

    let (stop_sender, stop_receiver) = BatchCoordinator::create_cancellation_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for running files to finish");
            let _ = stop_sender.send(());
        }
    });

    let mut coordinator =
        BatchCoordinator::new(config, Arc::new(provider), reporter)?.with_cancellation(stop_receiver);
    let result = coordinator.run_batch(jobs).await?;

    Ok(result.any_failed)
}

/// Config file (or defaults) with the command line overrides applied
async fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };

    for id in &args.enable {
        let setting = config.backends.setting_mut(*id);
        if !setting.is_enabled() {
            *setting = BackendSetting::Switch(true);
        }
    }
    for id in &args.disable {
        *config.backends.setting_mut(*id) = BackendSetting::Switch(false);
    }

    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(max_file_size) = args.max_file_size {
        config.max_file_size = max_file_size;
    }
    if let Some(timeout) = args.timeout {
        config.transform_timeout_secs = timeout;
    }
    config.dry_run |= args.dry_run;
    config.json_output |= args.json;

    config.validate()?;
    Ok(config)
}

/// Image files to process and the directory their relative paths start from
fn discover(input: &Path) -> Result<(Vec<PathBuf>, PathBuf)> {
    if input.is_dir() {
        return Ok((FileManager::find_image_files(input)?, input.to_path_buf()));
    }

    let base_dir = input.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok((vec![input.to_path_buf()], base_dir))
}
