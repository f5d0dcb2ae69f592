//! Export strategies and the fallback chain that drives them.
//!
//! The [`Exporter`] walks its strategies in order and returns the first
//! success. Every failure is logged and kept in the [`ExportReport`]; the
//! chain always ends with [`InlineDataUrlStrategy`], so a finished image is
//! never dropped.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use memeforge_common::clock::{utc_offset_label, Clock};
use memeforge_common::config::AppConfig;
use memeforge_common::error::{MemeError, MemeResult};
use memeforge_meme_model::raster::{EncodedImage, ExportFormat, FlattenedImage};

/// Progress callback for export.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Current stage.
    pub stage: ExportStage,

    /// Strategy being attempted, once the writing stage starts.
    pub strategy: Option<String>,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Encoding,
    Writing,
    Complete,
    Failed,
}

/// An encoded image plus the filename it should be saved under.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub image: &'a EncodedImage,
    pub filename: &'a str,
}

/// Where an exported image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Written to the path the user picked.
    Saved { path: PathBuf },

    /// Written into the downloads directory.
    Downloaded { path: PathBuf },

    /// Written to a scratch file and handed to the system viewer.
    Opened {
        path: PathBuf,
        launched: bool,
        instructions: String,
    },

    /// Nothing could be written; the image is carried inline.
    Inline { data_url: String },
}

impl ExportOutcome {
    /// File the image was written to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Saved { path } | Self::Downloaded { path } | Self::Opened { path, .. } => {
                Some(path.as_path())
            }
            Self::Inline { .. } => None,
        }
    }
}

/// Trait for export strategies (native save, downloads folder, viewer, ...).
pub trait ExportStrategy: Send + Sync {
    /// Strategy name.
    fn name(&self) -> &str;

    /// Whether the strategy can run at all in this environment.
    fn is_available(&self) -> bool;

    /// Deliver the image.
    fn export(&self, request: &ExportRequest<'_>) -> MemeResult<ExportOutcome>;
}

fn write_image(path: &Path, bytes: &[u8]) -> MemeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// First path in `dir` named `filename`, `stem-1.ext`, `stem-2.ext`, ...
/// that does not exist yet.
fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (filename, String::new()),
    };
    (1u32..)
        .map(|n| dir.join(format!("{stem}-{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Writes to a path the user chose explicitly.
#[derive(Debug, Clone, Default)]
pub struct NativeSaveStrategy {
    pub target: Option<PathBuf>,
}

impl NativeSaveStrategy {
    pub fn new(target: Option<PathBuf>) -> Self {
        Self { target }
    }
}

impl ExportStrategy for NativeSaveStrategy {
    fn name(&self) -> &str {
        "native-save"
    }

    fn is_available(&self) -> bool {
        self.target.is_some()
    }

    fn export(&self, request: &ExportRequest<'_>) -> MemeResult<ExportOutcome> {
        let path = self
            .target
            .clone()
            .ok_or_else(|| MemeError::export("No save path chosen"))?;
        write_image(&path, &request.image.bytes)?;
        Ok(ExportOutcome::Saved { path })
    }
}

/// Writes into a downloads directory, never overwriting earlier exports.
#[derive(Debug, Clone)]
pub struct DownloadStrategy {
    pub dir: PathBuf,
}

impl DownloadStrategy {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportStrategy for DownloadStrategy {
    fn name(&self) -> &str {
        "download"
    }

    fn is_available(&self) -> bool {
        !self.dir.as_os_str().is_empty()
    }

    fn export(&self, request: &ExportRequest<'_>) -> MemeResult<ExportOutcome> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            MemeError::export(format!(
                "Cannot use downloads directory {}: {e}",
                self.dir.display()
            ))
        })?;
        let path = unique_path(&self.dir, request.filename);
        write_image(&path, &request.image.bytes)?;
        Ok(ExportOutcome::Downloaded { path })
    }
}

/// Writes a scratch copy and asks the desktop to open it.
#[derive(Debug, Clone)]
pub struct OpenInViewerStrategy {
    pub dir: PathBuf,

    /// Launch the system opener. Disabled for headless runs and tests.
    pub launch: bool,
}

impl OpenInViewerStrategy {
    pub fn new(dir: impl Into<PathBuf>, launch: bool) -> Self {
        Self {
            dir: dir.into(),
            launch,
        }
    }
}

fn opener_command(path: &Path) -> Command {
    #[cfg(target_os = "macos")]
    let command = {
        let mut c = Command::new("open");
        c.arg(path);
        c
    };
    #[cfg(target_os = "windows")]
    let command = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command = {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    };
    command
}

impl ExportStrategy for OpenInViewerStrategy {
    fn name(&self) -> &str {
        "open-in-viewer"
    }

    fn is_available(&self) -> bool {
        !self.dir.as_os_str().is_empty()
    }

    fn export(&self, request: &ExportRequest<'_>) -> MemeResult<ExportOutcome> {
        let path = self.dir.join(request.filename);
        write_image(&path, &request.image.bytes)?;
        if !path.exists() {
            return Err(MemeError::export(format!(
                "Scratch copy {} vanished after writing",
                path.display()
            )));
        }

        let launched = self.launch
            && match opener_command(&path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Could not launch image viewer: {e}");
                    false
                }
            };

        let instructions = format!(
            "Your meme is at {}. Open it and use Save As to keep a copy.",
            path.display()
        );
        Ok(ExportOutcome::Opened {
            path,
            launched,
            instructions,
        })
    }
}

/// Returns the image as a data URL. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDataUrlStrategy;

impl ExportStrategy for InlineDataUrlStrategy {
    fn name(&self) -> &str {
        "inline-data-url"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn export(&self, request: &ExportRequest<'_>) -> MemeResult<ExportOutcome> {
        Ok(ExportOutcome::Inline {
            data_url: request.image.to_data_url(),
        })
    }
}

/// A strategy that failed during an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: String,
}

/// Result of walking the strategy chain.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub outcome: ExportOutcome,
    /// Name of the strategy that succeeded.
    pub strategy: String,
    pub filename: String,
    pub failures: Vec<StrategyFailure>,
}

impl ExportReport {
    pub fn used_fallback(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// `meme-YYYYMMDD-HHMMSS_UTC±H.<ext>` in the local time of `now`.
pub fn timestamped_filename(now: &DateTime<FixedOffset>, format: ExportFormat) -> String {
    format!(
        "meme-{}_UTC{}.{}",
        now.format("%Y%m%d-%H%M%S"),
        utc_offset_label(now),
        format.extension()
    )
}

/// Ordered strategy chain.
pub struct Exporter {
    strategies: Vec<Box<dyn ExportStrategy>>,
    clock: Arc<dyn Clock>,
}

impl Exporter {
    /// An exporter with no strategies besides the implicit inline fallback.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            strategies: Vec::new(),
            clock,
        }
    }

    pub fn with_strategy(mut self, strategy: impl ExportStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Native save (when `target` is set), downloads folder, viewer, inline.
    pub fn standard(
        config: &AppConfig,
        target: Option<PathBuf>,
        launch_viewer: bool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(clock)
            .with_strategy(NativeSaveStrategy::new(target))
            .with_strategy(DownloadStrategy::new(&config.downloads_dir))
            .with_strategy(OpenInViewerStrategy::new(&config.scratch_dir, launch_viewer))
            .with_strategy(InlineDataUrlStrategy)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Deliver an encoded image through the first strategy that succeeds.
    pub fn export(&self, image: &EncodedImage, progress: Option<&ProgressCallback>) -> ExportReport {
        let report = |progress_value: f64, stage: ExportStage, strategy: Option<&str>| {
            if let Some(cb) = progress {
                cb(ExportProgress {
                    progress: progress_value,
                    stage,
                    strategy: strategy.map(str::to_string),
                });
            }
        };

        let filename = timestamped_filename(&self.clock.now(), image.format);
        let request = ExportRequest {
            image,
            filename: &filename,
        };
        let mut failures = Vec::new();

        let available: Vec<&dyn ExportStrategy> = self
            .strategies
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| {
                let ok = s.is_available();
                if !ok {
                    tracing::debug!(strategy = s.name(), "Export strategy unavailable, skipping");
                }
                ok
            })
            .collect();

        for strategy in available {
            report(0.6, ExportStage::Writing, Some(strategy.name()));
            match strategy.export(&request) {
                Ok(outcome) => {
                    tracing::info!(
                        strategy = strategy.name(),
                        filename = %filename,
                        path = ?outcome.path(),
                        fallbacks = failures.len(),
                        "Export complete"
                    );
                    report(1.0, ExportStage::Complete, Some(strategy.name()));
                    return ExportReport {
                        outcome,
                        strategy: strategy.name().to_string(),
                        filename,
                        failures,
                    };
                }
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), "Export strategy failed: {e}");
                    report(0.6, ExportStage::Failed, Some(strategy.name()));
                    failures.push(StrategyFailure {
                        strategy: strategy.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let inline = InlineDataUrlStrategy;
        tracing::warn!(
            failures = failures.len(),
            "No export strategy succeeded, returning inline data URL"
        );
        report(1.0, ExportStage::Complete, Some(inline.name()));
        ExportReport {
            outcome: ExportOutcome::Inline {
                data_url: image.to_data_url(),
            },
            strategy: inline.name().to_string(),
            filename,
            failures,
        }
    }

    /// Encode a flattened image and export it.
    pub fn export_flattened(
        &self,
        image: &FlattenedImage,
        format: ExportFormat,
        progress: Option<&ProgressCallback>,
    ) -> MemeResult<ExportReport> {
        if let Some(cb) = progress {
            cb(ExportProgress {
                progress: 0.0,
                stage: ExportStage::Preparing,
                strategy: None,
            });
            cb(ExportProgress {
                progress: 0.3,
                stage: ExportStage::Encoding,
                strategy: None,
            });
        }

        let encoded = image.encode(format).map_err(|e| {
            if let Some(cb) = progress {
                cb(ExportProgress {
                    progress: 0.3,
                    stage: ExportStage::Failed,
                    strategy: None,
                });
            }
            MemeError::export(format!("Failed to encode {}: {e}", format.extension()))
        })?;

        tracing::debug!(
            format = format.extension(),
            bytes = encoded.bytes.len(),
            "Encoded image for export"
        );
        Ok(self.export(&encoded, progress))
    }
}
