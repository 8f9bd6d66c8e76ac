//! # Recompress In-Place - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Espansione degli input (file espliciti o JPEG della directory corrente)
//! - Collegamento di SIGINT/SIGTERM alla cancellazione globale
//! - Avvio dello scheduler e exit status finale
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (file, workers, config, eseguibile)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Espande gli input; nessun file da processare è un errore fatale
//! 4. Verifica che `jpeg-recompress` sia disponibile
//! 5. Ricomprime tutti i file con concorrenza limitata
//!
//! ## Esempio di utilizzo:
//! ```bash
//! recompress-inplace                       # tutti i JPEG nella directory corrente
//! recompress-inplace a.jpg b.JPG --workers 2 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use recompress_inplace::{
    AtomicReplacer, Config, FileManager, Job, JobScheduler, JpegRecompressTool, ProgressManager,
    RecompressOptions, RunState,
};

#[derive(Parser)]
#[command(name = "recompress-inplace")]
#[command(about = "Recompress JPEG files in place, replacing each original atomically")]
struct Args {
    /// Files to recompress (default: all JPEGs in the current directory)
    files: Vec<PathBuf>,

    /// Number of concurrent recompressions (default: number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the jpeg-recompress executable
    #[arg(long)]
    recompress_bin: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => {
            if !path.exists() {
                warn!("Config file {} not found, using defaults", path.display());
            }
            Config::from_file(path).await?
        }
        None => Config::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(bin) = args.recompress_bin {
        config.recompress_binary = bin;
    }
    config.show_progress |= args.progress;
    config.validate()?;

    let files = FileManager::expand_inputs(&args.files)?;
    if files.is_empty() {
        return Err(anyhow::anyhow!("No JPEGs to recompress."));
    }

    let tool = JpegRecompressTool::new(config.recompress_binary.clone());
    let program = tool.check_available()?;
    info!(
        "Recompressing {} files with {} ({} workers)",
        files.len(),
        program.display(),
        config.workers
    );

    let options = RecompressOptions::default();
    options.validate()?;

    let state = RunState::new(config.workers);
    tokio::spawn(cancel_on_signal(state.cancellation_token()));

    let scheduler = JobScheduler::new(AtomicReplacer::new(Arc::new(tool), options), state);
    let progress = ProgressManager::new(files.len() as u64, config.show_progress);
    let jobs = files.into_iter().map(Job::new).collect();

    let summary = scheduler.run(jobs, &progress).await;
    progress.finish(&summary.format_summary());

    if summary.failed > 0 {
        return Err(anyhow::anyhow!("{} file(s) failed to recompress", summary.failed));
    }
    if scheduler.state().is_cancelled() {
        return Err(anyhow::anyhow!("Run interrupted"));
    }

    Ok(())
}

/// Turn SIGINT (Ctrl-C) or SIGTERM into run-wide cancellation
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => warn!("Received SIGINT (Ctrl-C), cancelling remaining work"),
        () = terminate => warn!("Received SIGTERM, cancelling remaining work"),
        () = cancel.cancelled() => return,
    }

    cancel.cancel();
}
