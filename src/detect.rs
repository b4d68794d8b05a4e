//! Format detection for captured bitmaps and produced packages.

use crate::error::{Error, Result};

/// PNG signature: \x89PNG\r\n\x1a\n
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// JPEG start-of-image marker.
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Encoding of a captured bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG/JFIF
    Jpeg,
}

impl BitmapFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            BitmapFormat::Png => "png",
            BitmapFormat::Jpeg => "jpg",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            BitmapFormat::Png => "image/png",
            BitmapFormat::Jpeg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for BitmapFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Detect the bitmap encoding from its leading bytes.
pub fn detect_bitmap_format(data: &[u8]) -> Result<BitmapFormat> {
    if data.starts_with(&PNG_MAGIC) {
        Ok(BitmapFormat::Png)
    } else if data.starts_with(&JPEG_MAGIC) {
        Ok(BitmapFormat::Jpeg)
    } else {
        Err(Error::Generation(
            "Unrecognized image data (expected PNG or JPEG)".to_string(),
        ))
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_format_display() {
        assert_eq!(BitmapFormat::Png.to_string(), "image/png");
        assert_eq!(BitmapFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_detect_png() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert_eq!(detect_bitmap_format(&data).unwrap(), BitmapFormat::Png);
    }

    #[test]
    fn test_detect_jpeg() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert_eq!(detect_bitmap_format(&data).unwrap(), BitmapFormat::Jpeg);
    }

    #[test]
    fn test_detect_invalid_data() {
        let result = detect_bitmap_format(&[0x00, 0x00, 0x00, 0x00]);
        assert!(matches!(result, Err(Error::Generation(_))));
        assert!(detect_bitmap_format(&[]).is_err());
    }

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B])); // Too short
    }
}
