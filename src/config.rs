//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `RecompressOptions`, il bundle fisso passato a ogni ricompressione
//! - Definisce la struct `Config` con i parametri del run (worker, eseguibile, progress)
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Bundle di ricompressione (fisso):
//! - `method`: ricerca qualità guidata da SSIM
//! - `attempts`: 6 tentativi di ricerca
//! - `target`: nessun target esplicito
//! - `preset`: qualità "veryhigh"
//! - `jpeg_min` / `jpeg_max`: limiti qualità JPEG 40..=95
//! - `progressive`: encoding progressivo attivo, metadata non rimossi
//! - `copy_files`: copia il file originale se non comprimibile
//!
//! ## Parametri del run:
//! - `workers`: Numero di ricompressioni concorrenti (default: numero di CPU)
//! - `recompress_binary`: Eseguibile esterno (default: `jpeg-recompress`)
//! - `show_progress`: Mostra una progress bar (default: false)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Quality-search strategy used by the recompression routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityMethod {
    Mpe,
    Ssim,
    MsSsim,
    Smallfry,
}

impl QualityMethod {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Mpe => "mpe",
            Self::Ssim => "ssim",
            Self::MsSsim => "ms-ssim",
            Self::Smallfry => "smallfry",
        }
    }
}

/// Target perceptual quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl QualityPreset {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "veryhigh",
        }
    }
}

/// Input file type hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFiletype {
    Auto,
    Jpeg,
    Ppm,
}

impl InputFiletype {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Jpeg => "jpeg",
            Self::Ppm => "ppm",
        }
    }
}

/// Chroma subsampling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsampling {
    Default,
    Disable,
}

/// Fixed options bundle handed to every recompression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecompressOptions {
    /// Quality-search method
    pub method: QualityMethod,
    /// Number of search attempts
    pub attempts: u32,
    /// Explicit target metric value (None = derive from preset)
    pub target: Option<f64>,
    /// Quality preset
    pub preset: QualityPreset,
    /// Minimum JPEG quality
    pub jpeg_min: u8,
    /// Maximum JPEG quality
    pub jpeg_max: u8,
    /// Strip metadata
    pub strip: bool,
    /// Progressive encoding
    pub progressive: bool,
    /// Fisheye correction strength (0.0 = disabled)
    pub defish_strength: f32,
    /// Fisheye correction zoom
    pub defish_zoom: f32,
    /// Input format hint
    pub input_filetype: InputFiletype,
    /// Copy the input to the output when it cannot be made smaller
    pub copy_files: bool,
    /// Favour accuracy over speed in the quality search
    pub accurate: bool,
    /// Chroma subsampling
    pub subsample: Subsampling,
    /// Suppress the routine's own output
    pub quiet: bool,
}

impl Default for RecompressOptions {
    fn default() -> Self {
        Self {
            method: QualityMethod::Ssim,
            attempts: 6,
            target: None,
            preset: QualityPreset::VeryHigh,
            jpeg_min: 40,
            jpeg_max: 95,
            strip: false,
            progressive: true,
            defish_strength: 0.0,
            defish_zoom: 1.0,
            input_filetype: InputFiletype::Auto,
            copy_files: true,
            accurate: false,
            subsample: Subsampling::Default,
            quiet: true,
        }
    }
}

impl RecompressOptions {
    /// Validate the bundle before handing it out to workers
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_min == 0 || self.jpeg_max > 100 {
            return Err(anyhow::anyhow!("JPEG quality bounds must be between 1 and 100"));
        }

        if self.jpeg_min > self.jpeg_max {
            return Err(anyhow::anyhow!(
                "Minimum JPEG quality ({}) exceeds maximum ({})",
                self.jpeg_min,
                self.jpeg_max
            ));
        }

        if self.attempts == 0 {
            return Err(anyhow::anyhow!("Number of search attempts must be greater than 0"));
        }

        if let Some(target) = self.target {
            if target <= 0.0 {
                return Err(anyhow::anyhow!("Target must be positive"));
            }
        }

        Ok(())
    }
}

/// Configuration for a recompression run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent recompressions
    pub workers: usize,
    /// External recompression executable (name on PATH or explicit path)
    pub recompress_binary: PathBuf,
    /// Show a progress bar
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            recompress_binary: PathBuf::from("jpeg-recompress"),
            show_progress: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.workers > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(anyhow::anyhow!(
                "Number of workers must be at most {}",
                tokio::sync::Semaphore::MAX_PERMITS
            ));
        }

        if self.recompress_binary.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Recompression executable must not be empty"));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
