//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery dei JPEG.
//!
//! ## Responsabilità:
//! - Espansione degli argomenti CLI (lista esplicita o directory corrente)
//! - Discovery non ricorsiva dei JPEG in una directory
//! - Determinazione formato file tramite estensione (case-insensitive)
//! - Lettura dimensioni dei file
//! - Formattazione human-readable delle dimensioni
//!
//! ## Discovery:
//! La directory viene letta con un listing semplice e un filtro manuale
//! sul suffisso, senza glob. Alcuni mount di cloud-sync (es. OneDrive)
//! non restituiscono nulla tramite le API di glob.
//!
//! ## Utilità:
//! - `format_size()`: Converte bytes in formato leggibile (KB, MB, GB)
//! - `format_signed_size()`: Come sopra, con segno per risparmi negativi
//! - `calculate_reduction()`: Calcola percentuale di riduzione
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_jpegs(Path::new("/path/to/photos"))?;
//! for file in files {
//!     let size = FileManager::get_file_size(&file).await?;
//! }
//! ```

use crate::error::RecompressError;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Get the current size of a file in bytes
    pub async fn get_file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Turn command line arguments into the list of files to process.
    ///
    /// Explicit paths are taken as given; with no arguments the current
    /// working directory is scanned.
    pub fn expand_inputs(args: &[PathBuf]) -> Result<Vec<PathBuf>, RecompressError> {
        if !args.is_empty() {
            return Ok(args.to_vec());
        }

        let dir = std::env::current_dir().map_err(|e| RecompressError::Scan {
            path: PathBuf::from("."),
            source: e,
        })?;
        Self::find_jpegs(&dir)
    }

    /// Find the JPEG files directly inside `dir` (no recursion)
    pub fn find_jpegs(dir: &Path) -> Result<Vec<PathBuf>, RecompressError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| RecompressError::Scan {
                path: dir.to_path_buf(),
                source: std::io::Error::from(e),
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            if Self::is_jpeg(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check if a file is a JPEG by extension
    pub fn is_jpeg(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("jpg"))
            .unwrap_or(false)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Human-readable size that keeps the sign of a delta
    pub fn format_signed_size(delta: i64) -> String {
        if delta < 0 {
            format!("-{}", Self::format_size(delta.unsigned_abs()))
        } else {
            Self::format_size(delta as u64)
        }
    }

    /// Calculate percentage reduction (negative when the file grew)
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
