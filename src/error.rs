//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `RecompressError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi con il path coinvolto
//! - Integra con `thiserror` per automatic error conversion
//! - Distingue la cancellazione dai fallimenti reali
//!
//! ## Categorie di errori:
//! - `Scan`: Directory non leggibile durante l'espansione degli input
//! - `Stat`: Impossibile leggere la dimensione del file sorgente
//! - `TempFile`: Impossibile creare il file temporaneo accanto al sorgente
//! - `Service`: La ricompressione esterna è fallita (messaggio verbatim)
//! - `Cancelled`: Job interrotto dalla cancellazione globale del run
//! - `Rename`: Sostituzione atomica fallita
//! - `Restat`: Impossibile leggere la nuova dimensione dopo la sostituzione
//! - `MissingDependency`: Eseguibile esterno mancante
//!
//! ## Esempio:
//! ```rust,ignore
//! match replacer.replace(&cancel, &path).await {
//!     Err(e) if e.is_cancelled() => debug!("aborted"),
//!     Err(e) => error!("E: [{}] {}", path.display(), e),
//!     Ok(savings) => savings.report(),
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for in-place recompression
#[derive(thiserror::Error, Debug)]
pub enum RecompressError {
    #[error("failed to read directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create temporary file in {dir}: {source}")]
    TempFile {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Service(String),

    #[error("recompression cancelled")]
    Cancelled,

    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat replaced file {path}: {source}")]
    Restat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),
}

impl RecompressError {
    /// True when the job was aborted by run-wide cancellation rather than a real failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
