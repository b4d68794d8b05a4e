//! Error types for the deckport library.

use crate::model::{ExportError, ExportErrorKind};
use std::io;
use thiserror::Error;

/// Result type alias for deckport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing or encoding a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error decoding or encoding a bitmap.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Error writing or reading a ZIP archive.
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// A required package part is missing or dangling.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Captured image data is not valid base64.
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A slide surface could not be rasterized.
    #[error("Failed to capture slide {slide_id}: {message}")]
    Capture {
        /// Id of the slide whose surface failed.
        slide_id: String,
        /// Underlying cause.
        message: String,
    },

    /// An encoder could not build its artifact.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The download sink rejected a file.
    #[error("Download failed: {0}")]
    Download(String),

    /// The export request itself is unusable.
    #[error("{0}")]
    InvalidOptions(String),

    /// The export was cancelled by the caller.
    #[error("Export cancelled")]
    Cancelled,

    /// A failed export envelope re-raised as an error.
    #[error("{}", .0.message)]
    Export(ExportError),
}

impl Error {
    /// Classify this error into the export error taxonomy.
    pub fn kind(&self) -> ExportErrorKind {
        match self {
            Error::Capture { .. } => ExportErrorKind::CaptureFailed,
            Error::Image(_)
            | Error::Zip(_)
            | Error::Xml(_)
            | Error::MissingComponent(_)
            | Error::Base64(_) => ExportErrorKind::GenerationFailed,
            Error::Generation(_) => ExportErrorKind::GenerationFailed,
            Error::Download(_) => ExportErrorKind::DownloadFailed,
            Error::Io(_) => ExportErrorKind::Unknown,
            Error::InvalidOptions(_) => ExportErrorKind::InvalidOptions,
            Error::Cancelled => ExportErrorKind::Cancelled,
            Error::Export(err) => err.kind,
        }
    }

    /// Id of the slide this error concerns, if any.
    pub fn slide_id(&self) -> Option<&str> {
        match self {
            Error::Capture { slide_id, .. } => Some(slide_id),
            Error::Export(err) => err.slide_id.as_deref(),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<ExportError> for Error {
    fn from(err: ExportError) -> Self {
        match err.kind {
            ExportErrorKind::Cancelled => Error::Cancelled,
            _ => Error::Export(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Export cancelled");

        let err = Error::Capture {
            slide_id: "intro".to_string(),
            message: "surface detached".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to capture slide intro: surface detached"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ExportErrorKind::Unknown);
        assert_eq!(Error::Download("disk full".into()).kind(), ExportErrorKind::DownloadFailed);
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            Error::Generation("zip".into()).kind(),
            ExportErrorKind::GenerationFailed
        );
        assert_eq!(
            Error::InvalidOptions("No slides to export".into()).kind(),
            ExportErrorKind::InvalidOptions
        );
        let capture = Error::Capture {
            slide_id: "s1".into(),
            message: "gone".into(),
        };
        assert_eq!(capture.kind(), ExportErrorKind::CaptureFailed);
        assert_eq!(capture.slide_id(), Some("s1"));
    }

    #[test]
    fn test_export_error_round_trip_keeps_message() {
        let err = ExportError::new(ExportErrorKind::GenerationFailed, "archive broke");
        let wrapped: Error = err.into();
        assert_eq!(wrapped.to_string(), "archive broke");
        assert_eq!(wrapped.kind(), ExportErrorKind::GenerationFailed);

        let cancelled: Error = ExportError::new(ExportErrorKind::Cancelled, "stop").into();
        assert!(matches!(cancelled, Error::Cancelled));
    }
}
