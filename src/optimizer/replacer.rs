//! # Atomic File Replacer
//!
//! Recompresses one file in place without ever exposing a partially
//! written result: the new version is produced in a sibling temporary file
//! and renamed over the original only once the Service has finished.
//!
//! Per-job sequence: stat -> create temp -> recompress -> rename -> stat -> report.

use crate::{
    config::RecompressOptions,
    error::RecompressError,
    file_manager::FileManager,
    progress::FileSavings,
    recompress::Recompressor,
};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Replaces a single file with its recompressed version
pub struct AtomicReplacer {
    recompressor: Arc<dyn Recompressor>,
    options: Arc<RecompressOptions>,
}

impl AtomicReplacer {
    pub fn new(recompressor: Arc<dyn Recompressor>, options: RecompressOptions) -> Self {
        Self {
            recompressor,
            options: Arc::new(options),
        }
    }

    /// Recompress `source` and atomically swap the result into place.
    ///
    /// On any error the original is untouched and the temporary file is
    /// removed. After a successful rename the temporary name no longer exists.
    pub async fn replace(
        &self,
        cancel: &CancellationToken,
        source: &Path,
    ) -> Result<FileSavings, RecompressError> {
        let metadata = tokio::fs::metadata(source)
            .await
            .map_err(|e| RecompressError::Stat {
                path: source.to_path_buf(),
                source: e,
            })?;
        let old_size = metadata.len();

        // Same directory as the source so the final rename never crosses filesystems
        let dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let temp_path = blocking({
            let dir = dir.clone();
            move || {
                tempfile::Builder::new()
                    .prefix("recompress")
                    .tempfile_in(&dir)
                    .map(tempfile::NamedTempFile::into_temp_path)
            }
        })
        .await
        .map_err(|e| RecompressError::TempFile { dir, source: e })?;
        let temp_name = temp_path.to_path_buf();
        debug!("Recompressing {} into {}", source.display(), temp_name.display());

        // From here on, returning early drops `temp_path`, which deletes the file
        let mut task = tokio::spawn({
            let recompressor = Arc::clone(&self.recompressor);
            let options = Arc::clone(&self.options);
            let input = source.to_path_buf();
            let output = temp_name.clone();
            async move { recompressor.recompress(&input, &output, &options).await }
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                task.abort();
                let _ = task.await;
                return Err(RecompressError::Cancelled);
            }
            joined = &mut task => match joined {
                Ok(result) => result?,
                Err(e) => {
                    return Err(RecompressError::Service(format!(
                        "recompression task failed: {}",
                        e
                    )))
                }
            },
        }

        if let Err(e) = tokio::fs::set_permissions(&temp_name, metadata.permissions()).await {
            warn!(
                "Could not copy permissions of {} onto {}: {}",
                source.display(),
                temp_name.display(),
                e
            );
        }

        // A failed persist hands back the TempPath, dropping it removes the file
        blocking({
            let target = source.to_path_buf();
            move || temp_path.persist(target).map_err(|e| e.error)
        })
        .await
        .map_err(|e| RecompressError::Rename {
            from: temp_name.clone(),
            to: source.to_path_buf(),
            source: e,
        })?;

        let new_size = FileManager::get_file_size(source)
            .await
            .map_err(|e| RecompressError::Restat {
                path: source.to_path_buf(),
                source: e,
            })?;

        let savings = FileSavings::new(source.to_path_buf(), old_size, new_size);
        savings.report();
        Ok(savings)
    }
}

/// Run a blocking filesystem call off the async worker threads
async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(io::Error::from)?
}
