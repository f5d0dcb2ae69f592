//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MemeResult;

/// Default upload ceiling: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the durable saved-meme store.
    pub library_dir: PathBuf,

    /// Directory timestamped downloads are written to.
    pub downloads_dir: PathBuf,

    /// Scratch directory for images handed to the system viewer.
    pub scratch_dir: PathBuf,

    /// Upload validation and decode retry settings.
    #[serde(default)]
    pub ingest: IngestDefaults,

    /// Compositor settings.
    #[serde(default)]
    pub render: RenderDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upload validation and decode retry parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestDefaults {
    /// Largest accepted upload in bytes.
    pub max_bytes: u64,

    /// Total decode attempts (1 = no retry).
    pub retry_attempts: u32,

    /// Fixed delay between decode attempts.
    pub retry_backoff_ms: u64,
}

/// Compositor parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDefaults {
    /// Watermark text stamped in the lower-right corner.
    pub watermark: String,

    /// Optional TrueType files per caption font. Unset fonts use the
    /// built-in bitmap face.
    #[serde(default)]
    pub fonts: FontPaths,
}

/// Paths to TrueType/OpenType files for each caption font.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontPaths {
    pub impact: Option<PathBuf>,
    pub arial: Option<PathBuf>,
    pub comic: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "memeforge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_dir: data_dir(),
            downloads_dir: downloads_dir(),
            scratch_dir: std::env::temp_dir().join("memeforge"),
            ingest: IngestDefaults::default(),
            render: RenderDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IngestDefaults {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            retry_attempts: 2,
            retry_backoff_ms: 200,
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            watermark: "memeforge".to_string(),
            fonts: FontPaths::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> MemeResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config as pretty JSON at `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> MemeResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "Wrote config");
        Ok(())
    }

    /// Where `load`/`save` look for the config file.
    pub fn path() -> PathBuf {
        config_file_path()
    }
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("memeforge").join("config.json")
}

/// Default saved-meme library directory.
fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"));
    base.join("memeforge")
}

/// Default downloads directory.
fn downloads_dir() -> PathBuf {
    std::env::var("XDG_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("Downloads"))
}
