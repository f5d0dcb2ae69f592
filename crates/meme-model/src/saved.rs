//! Saved meme records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::raster::{EncodedImage, ExportFormat, FlattenedImage, RasterError};

/// A persisted, already-flattened meme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMeme {
    /// Unique identifier.
    pub id: String,

    /// PNG data URL of the flattened image.
    pub image_data: String,

    /// Caption text that was burned in.
    pub caption: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SavedMeme {
    /// Build a record from compositor output.
    ///
    /// The id combines the creation time with a hash of the encoded
    /// pixels, so saving the same render twice yields the same id only
    /// when it also happens in the same millisecond.
    pub fn from_flattened(
        image: &FlattenedImage,
        caption: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, RasterError> {
        let encoded = image.encode(ExportFormat::Png)?;
        Ok(Self {
            id: format!(
                "{:x}-{:016x}",
                created_at.timestamp_millis(),
                fnv1a_64(&encoded.bytes)
            ),
            image_data: encoded.to_data_url(),
            caption: caption.into(),
            created_at,
        })
    }

    /// Decode the stored image bytes.
    pub fn image(&self) -> Result<EncodedImage, RasterError> {
        EncodedImage::from_data_url(&self.image_data)
    }

    /// Creation time as RFC 3339 with second precision.
    pub fn created_at_display(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn fnv1a_64(input: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
