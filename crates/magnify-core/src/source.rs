//! The user-selected source image.

use std::io::Cursor;
use std::sync::Arc;

use image::ImageReader;

use crate::types::{Dimensions, UpscaleError};

/// Allowed file extensions for source images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "gif"];

/// Check whether a filename has an allowed image extension.
#[must_use]
pub fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Raw bytes of a selected image file plus its name.
///
/// The bytes are shared so a running job and the controller can both
/// hold the source without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    name: String,
    bytes: Arc<[u8]>,
}

impl SourceImage {
    /// Wrap file bytes and the original file name.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// The file name as selected by the user.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The encoded file bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File name without its extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(base, _)| base)
    }

    /// MIME type guessed from the encoded bytes.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        image::guess_format(&self.bytes)
            .map_or("application/octet-stream", |format| format.to_mime_type())
    }

    /// Read the image header for the preview panel without decoding pixels.
    ///
    /// # Errors
    ///
    /// Returns [`UpscaleError::EmptyInput`] for an empty file and
    /// [`UpscaleError::Decode`] if the format is not recognised.
    pub fn probe(&self) -> Result<SourceInfo, UpscaleError> {
        if self.bytes.is_empty() {
            return Err(UpscaleError::EmptyInput);
        }
        let (width, height) = ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .into_dimensions()?;
        Ok(SourceInfo {
            name: self.name.clone(),
            size_bytes: self.bytes.len(),
            dimensions: Dimensions::new(width, height),
        })
    }
}

/// File details shown next to the preview of the selected image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// File name.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: usize,
    /// Pixel dimensions.
    pub dimensions: Dimensions,
}

impl SourceInfo {
    /// File size formatted as kilobytes with two decimals (e.g. `12.50 KB`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.size_bytes as f64 / 1024.0)
    }
}
