//! # Recompress In-Place Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `config`: Bundle di ricompressione fisso e configurazione del run
//! - `error`: Tipi di errore custom per ogni fase di un job
//! - `file_manager`: Discovery dei JPEG e utilità sulle dimensioni
//! - `recompress`: Contratto del Recompression Service e adapter `jpeg-recompress`
//! - `optimizer`: Sostituzione atomica e scheduler dei job
//! - `progress`: Reporting dei risparmi e statistiche
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use recompress_inplace::{AtomicReplacer, JobScheduler, JpegRecompressTool, RunState};
//!
//! let replacer = AtomicReplacer::new(Arc::new(JpegRecompressTool::default()), RecompressOptions::default());
//! let scheduler = JobScheduler::new(replacer, RunState::new(num_cpus::get()));
//! let summary = scheduler.run(jobs, &progress).await;
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod optimizer;
pub mod progress;
pub mod recompress;
pub mod utils;

pub use config::{Config, RecompressOptions};
pub use error::RecompressError;
pub use file_manager::FileManager;
pub use optimizer::{AtomicReplacer, Job, JobOutcome, JobScheduler, RunState};
pub use progress::{FileSavings, ProgressManager, RunSummary};
pub use recompress::{JpegRecompressTool, Recompressor};
