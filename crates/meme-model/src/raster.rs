//! Raster value types flowing through the pipeline.
//!
//! - [`SourceImage`]: a decoded upload, never zero-sized.
//! - [`FlattenedImage`]: compositor output with the caption burned in.
//! - [`EncodedImage`]: encoded bytes ready to be written or persisted.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

/// Upload MIME types the pipeline knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageMime {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/avif")]
    Avif,
}

impl ImageMime {
    pub const ALL: [ImageMime; 4] = [
        ImageMime::Jpeg,
        ImageMime::Png,
        ImageMime::Webp,
        ImageMime::Avif,
    ];

    /// Parse a MIME string such as `image/png`. Parameters are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "jfif" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Detect from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(PNG_SIGNATURE) {
            return Some(Self::Png);
        }
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Some(Self::Webp);
        }
        if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            let brand = &bytes[8..12];
            if brand == b"avif" || brand == b"avis" {
                return Some(Self::Avif);
            }
        }
        None
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
            Self::Avif => ImageFormat::Avif,
        }
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Encodings available for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    /// Lossless WebP.
    Webp,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

/// Errors constructing or converting raster values.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Malformed data URL: {message}")]
    DataUrl { message: String },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// A decoded upload ready for compositing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbaImage,
    mime: ImageMime,
}

impl SourceImage {
    /// Wrap decoded pixels, rejecting zero-sized images.
    pub fn new(pixels: RgbaImage, mime: ImageMime) -> Result<Self, RasterError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyImage { width, height });
        }
        Ok(Self { pixels, mime })
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Compositor output: base image with caption and watermark burned in.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedImage {
    pixels: RgbaImage,
}

impl FlattenedImage {
    /// Take ownership of a finished canvas.
    pub fn from_canvas(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Encode to the given format. JPEG drops the alpha channel.
    pub fn encode(&self, format: ExportFormat) -> Result<EncodedImage, RasterError> {
        let mut buf = Cursor::new(Vec::new());
        match format {
            ExportFormat::Jpeg => {
                DynamicImage::ImageRgba8(self.pixels.clone())
                    .to_rgb8()
                    .write_to(&mut buf, format.image_format())?;
            }
            ExportFormat::Png | ExportFormat::Webp => {
                self.pixels.write_to(&mut buf, format.image_format())?;
            }
        }
        Ok(EncodedImage {
            format,
            bytes: buf.into_inner(),
        })
    }

    /// PNG data URL (`data:image/png;base64,...`).
    pub fn to_data_url(&self) -> Result<String, RasterError> {
        Ok(self.encode(ExportFormat::Png)?.to_data_url())
    }
}

/// Encoded image bytes with their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            STANDARD.encode(&self.bytes)
        )
    }

    /// Parse a base64 data URL produced by [`EncodedImage::to_data_url`].
    pub fn from_data_url(url: &str) -> Result<Self, RasterError> {
        let rest = url.strip_prefix("data:").ok_or_else(|| RasterError::DataUrl {
            message: "missing data: prefix".to_string(),
        })?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| RasterError::DataUrl {
                message: "expected ;base64, separator".to_string(),
            })?;
        let format = match mime {
            "image/png" => ExportFormat::Png,
            "image/jpeg" => ExportFormat::Jpeg,
            "image/webp" => ExportFormat::Webp,
            other => {
                return Err(RasterError::DataUrl {
                    message: format!("unsupported media type {other}"),
                })
            }
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| RasterError::DataUrl {
                message: e.to_string(),
            })?;
        Ok(Self { format, bytes })
    }
}
