//! # Recompression Service
//!
//! Contract for the routine that actually re-encodes a JPEG, plus the
//! production adapter that drives the `jpeg-recompress` executable from
//! jpeg-archive.
//!
//! The orchestration core only ever talks to [`Recompressor`]; the quality
//! search and the codec live entirely behind it.

use crate::args;
use crate::config::{InputFiletype, RecompressOptions, Subsampling};
use crate::error::RecompressError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Produces a recompressed copy of `input` at `output`.
///
/// Implementations must either leave a complete file at `output` and return
/// `Ok(())`, or return [`RecompressError::Service`] with a descriptive
/// message. The output path already exists (as an empty placeholder) when
/// this is called and must be overwritten.
///
/// The caller may drop the returned future at any point when the run is
/// cancelled; an implementation that spawns work should stop it on drop.
#[async_trait]
pub trait Recompressor: Send + Sync {
    async fn recompress(
        &self,
        input: &Path,
        output: &Path,
        options: &RecompressOptions,
    ) -> Result<(), RecompressError>;
}

/// Adapter for the external `jpeg-recompress` command line tool
#[derive(Debug, Clone)]
pub struct JpegRecompressTool {
    program: PathBuf,
}

impl JpegRecompressTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the executable, either as an explicit path or through `PATH`
    pub fn resolve(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 {
            return self.program.is_file().then(|| self.program.clone());
        }

        let extension = if cfg!(windows) { ".exe" } else { "" };
        let mut name = self.program.clone().into_os_string();
        if !extension.is_empty() && self.program.extension().is_none() {
            name.push(extension);
        }

        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(&name))
            .find(|candidate| candidate.is_file())
    }

    /// Fail early when the executable cannot be found
    pub fn check_available(&self) -> Result<PathBuf, RecompressError> {
        self.resolve().ok_or_else(|| {
            RecompressError::MissingDependency(format!(
                "{} not found. Install jpeg-archive or pass --recompress-bin",
                self.program.display()
            ))
        })
    }

    /// Map the options bundle onto `jpeg-recompress` flags
    pub fn build_args(input: &Path, output: &Path, options: &RecompressOptions) -> Vec<OsString> {
        let mut args = args![
            "--method",
            options.method.as_arg(),
            "--loops",
            options.attempts.to_string(),
            "--quality",
            options.preset.as_arg(),
            "--min",
            options.jpeg_min.to_string(),
            "--max",
            options.jpeg_max.to_string(),
        ];

        if let Some(target) = options.target {
            args.extend(args!["--target", target.to_string()]);
        }
        if options.accurate {
            args.extend(args!["--accurate"]);
        }
        if options.strip {
            args.extend(args!["--strip"]);
        }
        if !options.progressive {
            args.extend(args!["--no-progressive"]);
        }
        if options.defish_strength != 0.0 {
            args.extend(args![
                "--defish",
                options.defish_strength.to_string(),
                "--zoom",
                options.defish_zoom.to_string(),
            ]);
        }
        if options.input_filetype != InputFiletype::Auto {
            args.extend(args!["--input-filetype", options.input_filetype.as_arg()]);
        }
        if !options.copy_files {
            args.extend(args!["--no-copy"]);
        }
        if options.subsample == Subsampling::Disable {
            args.extend(args!["--subsample", "disable"]);
        }
        if options.quiet {
            args.extend(args!["--quiet"]);
        }

        args.extend(args![input, output]);
        args
    }
}

impl Default for JpegRecompressTool {
    fn default() -> Self {
        Self::new("jpeg-recompress")
    }
}

#[async_trait]
impl Recompressor for JpegRecompressTool {
    async fn recompress(
        &self,
        input: &Path,
        output: &Path,
        options: &RecompressOptions,
    ) -> Result<(), RecompressError> {
        let program = self.resolve().unwrap_or_else(|| self.program.clone());
        let args = Self::build_args(input, output, options);
        debug!("Running {} {:?}", program.display(), args);

        let start_time = std::time::Instant::now();
        let result = Command::new(&program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                RecompressError::Service(format!("failed to run {}: {}", program.display(), e))
            })?;
        debug!("{} finished in {:?}", input.display(), start_time.elapsed());

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        if stderr.is_empty() {
            Err(RecompressError::Service(format!(
                "{} exited with {}",
                program.display(),
                result.status
            )))
        } else {
            Err(RecompressError::Service(stderr))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityPreset;

    #[test]
    fn test_build_args_default_bundle() {
        let args = JpegRecompressTool::build_args(
            Path::new("/photos/a.jpg"),
            Path::new("/photos/recompress123"),
            &RecompressOptions::default(),
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args,
            vec![
                "--method", "ssim", "--loops", "6", "--quality", "veryhigh", "--min", "40",
                "--max", "95", "--quiet", "/photos/a.jpg", "/photos/recompress123",
            ]
        );
    }

    #[test]
    fn test_build_args_optional_flags() {
        let options = RecompressOptions {
            target: Some(0.9999),
            preset: QualityPreset::Medium,
            strip: true,
            progressive: false,
            defish_strength: 2.5,
            defish_zoom: 1.5,
            input_filetype: InputFiletype::Ppm,
            copy_files: false,
            accurate: true,
            subsample: Subsampling::Disable,
            quiet: false,
            ..RecompressOptions::default()
        };
        let args = JpegRecompressTool::build_args(Path::new("in.ppm"), Path::new("out.jpg"), &options);
        let joined = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");

        assert!(joined.contains("--quality medium"));
        assert!(joined.contains("--target 0.9999"));
        assert!(joined.contains("--accurate"));
        assert!(joined.contains("--strip"));
        assert!(joined.contains("--no-progressive"));
        assert!(joined.contains("--defish 2.5 --zoom 1.5"));
        assert!(joined.contains("--input-filetype ppm"));
        assert!(joined.contains("--no-copy"));
        assert!(joined.contains("--subsample disable"));
        assert!(!joined.contains("--quiet"));
        assert!(joined.ends_with("in.ppm out.jpg"));
    }

    #[test]
    fn test_missing_executable_is_reported() {
        let tool = JpegRecompressTool::new("definitely-not-a-real-jpeg-recompress");
        let err = tool.check_available().unwrap_err();
        assert!(matches!(err, RecompressError::MissingDependency(_)));
    }

    #[tokio::test]
    async fn test_unrunnable_executable_is_service_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let tool = JpegRecompressTool::new(temp_dir.path().join("missing-binary"));

        let err = tool
            .recompress(
                &temp_dir.path().join("a.jpg"),
                &temp_dir.path().join("out"),
                &RecompressOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RecompressError::Service(_)));
    }
}
