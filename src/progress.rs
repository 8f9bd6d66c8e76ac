//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il reporting dei risparmi e le statistiche del run.
//!
//! ## Responsabilità:
//! - Riga di log per ogni file sostituito (byte risparmiati e percentuale)
//! - Tracking statistiche del run (file riusciti, falliti, cancellati)
//! - Progress bar visual con `indicatif` (opzionale)
//!
//! ## Componenti principali:
//! - `FileSavings`: Risultato di una singola sostituzione
//! - `RunSummary`: Statistiche cumulative del run
//! - `ProgressManager`: Gestisce la progress bar principale
//!
//! ## Formato riga per file:
//! ```text
//! /photos/a.jpg: savings of 24.41 KB (decreased by 25.00%)
//! ```
//!
//! Se il Service produce un file più grande, il risparmio è negativo e
//! viene riportato così com'è.

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Size delta of one replaced file
#[derive(Debug, Clone, PartialEq)]
pub struct FileSavings {
    pub path: PathBuf,
    pub old_size: u64,
    pub new_size: u64,
}

impl FileSavings {
    pub fn new(path: PathBuf, old_size: u64, new_size: u64) -> Self {
        Self {
            path,
            old_size,
            new_size,
        }
    }

    /// Bytes saved; negative when the file grew
    pub fn savings(&self) -> i64 {
        self.old_size as i64 - self.new_size as i64
    }

    pub fn percent(&self) -> f64 {
        FileManager::calculate_reduction(self.old_size, self.new_size)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}: savings of {} (decreased by {:.2}%)",
            self.path.display(),
            FileManager::format_signed_size(self.savings()),
            self.percent()
        )
    }

    /// Emit the per-file savings line
    pub fn report(&self) {
        info!("{}", self.summary_line());
    }
}

/// Aggregate outcome of a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total_original_size: u64,
    pub total_bytes_saved: i64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_succeeded(&mut self, savings: &FileSavings) {
        self.succeeded += 1;
        self.total_original_size += savings.old_size;
        self.total_bytes_saved += savings.savings();
    }

    pub fn add_failed(&mut self) {
        self.failed += 1;
    }

    pub fn add_cancelled(&mut self) {
        self.cancelled += 1;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
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
            "Recompressed: {} files | Failed: {} | Cancelled: {} | Total saved: {} ({:.2}%)",
            self.succeeded,
            self.failed,
            self.cancelled,
            FileManager::format_signed_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}

/// Manages the optional progress bar
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar; hidden unless `visible`
    pub fn new(total_files: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::hidden()),
            };
        }

        let bar = ProgressBar::new(total_files);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one settled job
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
