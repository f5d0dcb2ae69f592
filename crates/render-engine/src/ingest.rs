//! Upload validation and decoding.
//!
//! Validation (type and size) runs before any decode work and never
//! touches editing state. Decoding runs on tokio's blocking pool and is
//! retried according to the [`RetryPolicy`] carried in [`IngestPolicy`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use memeforge_common::config::{IngestDefaults, DEFAULT_MAX_UPLOAD_BYTES};
use memeforge_common::error::{MemeError, MemeResult};
use memeforge_meme_model::raster::{ImageMime, RasterError, SourceImage};
use memeforge_meme_model::state::MemeState;

/// Whether this build can decode AVIF uploads (the `avif` feature).
pub const AVIF_DECODING: bool = cfg!(feature = "avif");

/// A user-provided file, as picked or dropped.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,

    /// MIME type reported by the picker, if any.
    pub declared_mime: Option<String>,

    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, declared_mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_mime,
            bytes,
        }
    }

    /// Read a file from disk, declaring the MIME type its extension implies.
    pub fn read(path: &Path) -> MemeResult<Self> {
        if !path.exists() {
            return Err(MemeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        Ok(Self::from_path_bytes(path, bytes))
    }

    fn from_path_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let declared_mime = ImageMime::from_path(path).map(|m| m.as_mime().to_string());
        Self::new(name, declared_mime, bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Bounded retry with a fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,

    /// Delay between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(2, Duration::from_millis(200))
    }
}

/// What uploads are accepted and how decoding is retried.
#[derive(Debug, Clone)]
pub struct IngestPolicy {
    pub allowed: Vec<ImageMime>,
    pub max_bytes: u64,
    pub retry: RetryPolicy,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            allowed: ImageMime::ALL.to_vec(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            retry: RetryPolicy::default(),
        }
    }
}

impl IngestPolicy {
    pub fn from_config(config: &IngestDefaults) -> Self {
        Self {
            allowed: ImageMime::ALL.to_vec(),
            max_bytes: config.max_bytes,
            retry: RetryPolicy::fixed(
                config.retry_attempts,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        }
    }
}

/// Errors rejecting or decoding an upload.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported image type: {mime} (expected JPEG, PNG, WEBP or AVIF)")]
    UnsupportedType { mime: String },

    #[error("File is too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Could not decode image: {message}")]
    Decode { message: String },

    #[error("Decode task did not finish: {message}")]
    Interrupted { message: String },

    #[error("Image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Could not read upload: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Validation failures are reported before decoding starts.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. } | Self::TooLarge { .. })
    }

    /// Only failures outside the codec are worth another attempt; the
    /// same bytes always decode the same way.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

impl From<IngestError> for MemeError {
    fn from(err: IngestError) -> Self {
        MemeError::ingest(err.to_string())
    }
}

/// Check type and size without decoding. Returns the resolved MIME type.
///
/// The content's magic bytes win over the declared type, which is only
/// consulted when sniffing finds nothing.
pub fn validate(file: &UploadedFile, policy: &IngestPolicy) -> Result<ImageMime, IngestError> {
    let mime = match (ImageMime::sniff(&file.bytes), file.declared_mime.as_deref()) {
        (Some(sniffed), declared) => {
            if let Some(declared) = declared.filter(|d| ImageMime::from_mime(d) != Some(sniffed)) {
                tracing::debug!(name = %file.name, declared, %sniffed, "Declared type does not match content");
            }
            sniffed
        }
        (None, Some(declared)) => {
            ImageMime::from_mime(declared).ok_or_else(|| IngestError::UnsupportedType {
                mime: declared.to_string(),
            })?
        }
        (None, None) => {
            return Err(IngestError::UnsupportedType {
                mime: "unknown".to_string(),
            })
        }
    };

    if !policy.allowed.contains(&mime) {
        return Err(IngestError::UnsupportedType {
            mime: mime.as_mime().to_string(),
        });
    }

    if file.size() > policy.max_bytes {
        return Err(IngestError::TooLarge {
            size: file.size(),
            limit: policy.max_bytes,
        });
    }

    Ok(mime)
}

fn decode(bytes: &[u8], mime: ImageMime) -> Result<SourceImage, IngestError> {
    let decoded = image::load_from_memory_with_format(bytes, mime.image_format()).map_err(|e| {
        IngestError::Decode {
            message: e.to_string(),
        }
    })?;
    SourceImage::new(decoded.to_rgba8(), mime).map_err(|e| match e {
        RasterError::EmptyImage { width, height } => IngestError::EmptyImage { width, height },
        other => IngestError::Decode {
            message: other.to_string(),
        },
    })
}

/// Validate and decode an upload.
///
/// Decoding completes before this returns; callers never see a partially
/// decoded image.
pub async fn ingest(file: UploadedFile, policy: &IngestPolicy) -> Result<SourceImage, IngestError> {
    let mime = validate(&file, policy)?;
    tracing::debug!(name = %file.name, %mime, size = file.size(), "Upload accepted");

    let bytes: Arc<[u8]> = file.bytes.into();
    let attempts = policy.retry.attempts();
    let mut last_error = None;

    for attempt in 1..=attempts {
        let input = bytes.clone();
        let result = tokio::task::spawn_blocking(move || decode(&input, mime))
            .await
            .unwrap_or_else(|join| {
                Err(IngestError::Interrupted {
                    message: join.to_string(),
                })
            });

        match result {
            Ok(image) => {
                tracing::info!(
                    name = %file.name,
                    width = image.width(),
                    height = image.height(),
                    attempt,
                    "Image decoded"
                );
                return Ok(image);
            }
            Err(err) if !err.is_retryable() => {
                tracing::warn!(name = %file.name, attempt, "Decode failed: {err}");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(name = %file.name, attempt, attempts, "Decode failed: {err}");
                last_error = Some(err);
                if attempt < attempts && !policy.retry.backoff.is_zero() {
                    tokio::time::sleep(policy.retry.backoff).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| IngestError::Interrupted {
        message: "no decode attempt was made".to_string(),
    }))
}

/// Read `path` without blocking the runtime, then ingest it.
pub async fn ingest_path(path: &Path, policy: &IngestPolicy) -> Result<SourceImage, IngestError> {
    let bytes = tokio::fs::read(path).await?;
    ingest(UploadedFile::from_path_bytes(path, bytes), policy).await
}

/// Ingest an upload and return the state with it as the source image.
/// On error `state` is left as it was.
pub async fn ingest_into(
    state: &MemeState,
    file: UploadedFile,
    policy: &IngestPolicy,
) -> Result<MemeState, IngestError> {
    let image = ingest(file, policy).await?;
    Ok(state.clone().with_source(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encoded(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([10, 200, 30, 255]),
        ));
        let img = if format == ImageFormat::Jpeg {
            image::DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn fast_policy() -> IngestPolicy {
        IngestPolicy {
            retry: RetryPolicy::fixed(3, Duration::ZERO),
            ..IngestPolicy::default()
        }
    }

    #[test]
    fn test_validate_rejects_unsupported_types() {
        let gif = UploadedFile::new("a.gif", Some("image/gif".into()), b"GIF89a".to_vec());
        let err = validate(&gif, &IngestPolicy::default()).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedType { .. }));
        assert!(err.is_validation());

        let unknown = UploadedFile::new("blob", None, vec![1, 2, 3]);
        assert!(matches!(
            validate(&unknown, &IngestPolicy::default()),
            Err(IngestError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_validate_honors_allowed_list() {
        let png = UploadedFile::new("a.png", None, encoded(ImageFormat::Png, 2, 2));
        let policy = IngestPolicy {
            allowed: vec![ImageMime::Jpeg],
            ..IngestPolicy::default()
        };
        assert!(matches!(
            validate(&png, &policy),
            Err(IngestError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_validate_sniffs_when_undeclared() {
        let png = UploadedFile::new("a", None, encoded(ImageFormat::Png, 2, 2));
        assert_eq!(validate(&png, &IngestPolicy::default()).unwrap(), ImageMime::Png);
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = IngestPolicy {
            max_bytes: 4,
            ..IngestPolicy::default()
        };
        let at_limit = UploadedFile::new("a.jpg", Some("image/jpeg".into()), vec![0xFF; 4]);
        let over = UploadedFile::new("a.jpg", Some("image/jpeg".into()), vec![0xFF; 5]);
        assert!(validate(&at_limit, &policy).is_ok());
        assert!(matches!(
            validate(&over, &policy),
            Err(IngestError::TooLarge { size: 5, limit: 4 })
        ));
    }

    #[tokio::test]
    async fn test_ten_megabyte_jpeg_is_rejected_and_state_unchanged() {
        let mut bytes = vec![0u8; 10 * 1024 * 1024];
        bytes[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        let upload = UploadedFile::new("huge.jpg", Some("image/jpeg".into()), bytes);

        let original = SourceImage::new(RgbaImage::new(3, 3), ImageMime::Png).unwrap();
        let state = MemeState::new().with_source(original);
        let before = state.source().cloned();

        let err = ingest_into(&state, upload, &IngestPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::TooLarge { .. }));

        let after = state.source().cloned();
        assert!(Arc::ptr_eq(&before.unwrap(), &after.unwrap()));
    }

    #[tokio::test]
    async fn test_ingest_decodes_png_and_jpeg() {
        let png = UploadedFile::new("a.png", Some("image/png".into()), encoded(ImageFormat::Png, 7, 5));
        let image = ingest(png, &fast_policy()).await.unwrap();
        assert_eq!((image.width(), image.height()), (7, 5));
        assert_eq!(image.mime(), ImageMime::Png);
        assert_eq!(image.pixels().get_pixel(0, 0), &Rgba([10, 200, 30, 255]));

        let jpeg = UploadedFile::new("a.jpg", None, encoded(ImageFormat::Jpeg, 16, 8));
        let image = ingest(jpeg, &fast_policy()).await.unwrap();
        assert_eq!((image.width(), image.height()), (16, 8));
        assert_eq!(image.mime(), ImageMime::Jpeg);
    }

    #[tokio::test]
    async fn test_corrupt_image_fails_without_retrying() {
        let mut bytes = encoded(ImageFormat::Png, 4, 4);
        bytes.truncate(20);
        let upload = UploadedFile::new("broken.png", Some("image/png".into()), bytes);
        let policy = IngestPolicy {
            retry: RetryPolicy::fixed(3, Duration::from_secs(60)),
            ..IngestPolicy::default()
        };
        let started = std::time::Instant::now();
        let err = ingest(upload, &policy).await.unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }));
        assert!(!err.is_validation());
        assert!(!err.is_retryable());
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_only_interrupted_decodes_are_retryable() {
        let interrupted = IngestError::Interrupted {
            message: "task cancelled".into(),
        };
        assert!(interrupted.is_retryable());
        assert!(!interrupted.is_validation());
        assert!(!IngestError::EmptyImage { width: 0, height: 1 }.is_retryable());
    }

    #[test]
    fn test_content_wins_over_declared_type() {
        let jpeg = UploadedFile::new("photo.png", Some("image/png".into()), encoded(ImageFormat::Jpeg, 2, 2));
        assert_eq!(validate(&jpeg, &IngestPolicy::default()).unwrap(), ImageMime::Jpeg);

        let gif = UploadedFile::new("a.png", Some("image/png".into()), b"GIF89a....".to_vec());
        assert_eq!(validate(&gif, &IngestPolicy::default()).unwrap(), ImageMime::Png);
    }

    #[tokio::test]
    async fn test_mislabeled_file_on_disk_still_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, encoded(ImageFormat::Jpeg, 6, 4)).unwrap();

        let image = ingest_path(&path, &fast_policy()).await.unwrap();
        assert_eq!((image.width(), image.height()), (6, 4));
        assert_eq!(image.mime(), ImageMime::Jpeg);
    }

    #[tokio::test]
    async fn test_ingest_into_swaps_source() {
        let png = UploadedFile::new("a.png", None, encoded(ImageFormat::Png, 2, 3));
        let state = MemeState::new();
        let next = ingest_into(&state, png, &fast_policy()).await.unwrap();
        assert!(state.source().is_none());
        assert_eq!(next.source().unwrap().height(), 3);
    }

    #[tokio::test]
    async fn test_ingest_path_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, encoded(ImageFormat::Png, 5, 4)).unwrap();
        let image = ingest_path(&path, &fast_policy()).await.unwrap();
        assert_eq!((image.width(), image.height()), (5, 4));

        let err = ingest_path(&dir.path().join("missing.png"), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }

    #[test]
    fn test_read_missing_file() {
        let err = UploadedFile::read(Path::new("/no/such/meme.png")).unwrap_err();
        assert!(matches!(err, MemeError::FileNotFound { .. }));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = IngestPolicy::from_config(&IngestDefaults {
            max_bytes: 1024,
            retry_attempts: 4,
            retry_backoff_ms: 50,
        });
        assert_eq!(policy.max_bytes, 1024);
        assert_eq!(policy.retry, RetryPolicy::fixed(4, Duration::from_millis(50)));
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).attempts(), 1);
    }
}
