//! Terminal export outcome envelope.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of export failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportErrorKind {
    /// A slide surface could not be rasterized
    CaptureFailed,
    /// The encoder could not build its artifact
    GenerationFailed,
    /// The save mechanism rejected the output
    DownloadFailed,
    /// Bad input: empty slide set, unsupported format, concurrent export
    InvalidOptions,
    /// Stopped on request
    Cancelled,
    /// Anything else
    Unknown,
}

impl fmt::Display for ExportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportErrorKind::CaptureFailed => "capture_failed",
            ExportErrorKind::GenerationFailed => "generation_failed",
            ExportErrorKind::DownloadFailed => "download_failed",
            ExportErrorKind::InvalidOptions => "invalid_options",
            ExportErrorKind::Cancelled => "cancelled",
            ExportErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Structured description of a failed export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportError {
    /// Failure class
    #[serde(rename = "type")]
    pub kind: ExportErrorKind,
    /// Human-readable message
    pub message: String,
    /// Additional diagnostic detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Slide the failure concerns, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_id: Option<String>,
    /// When the failure was recorded
    pub timestamp: DateTime<Utc>,
}

impl ExportError {
    /// Create an error record stamped with the current time.
    pub fn new(kind: ExportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            slide_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach diagnostic detail.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach the id of the slide concerned.
    pub fn with_slide_id(mut self, slide_id: impl Into<String>) -> Self {
        self.slide_id = Some(slide_id.into());
        self
    }
}

impl From<&Error> for ExportError {
    fn from(err: &Error) -> Self {
        if let Error::Export(inner) = err {
            return inner.clone();
        }
        let mut record = ExportError::new(err.kind(), err.to_string());
        if let Some(id) = err.slide_id() {
            record.slide_id = Some(id.to_string());
        }
        record
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

/// Counters describing an export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    /// Slides handed to the stage
    pub total_slides: usize,
    /// Slides that made it into the artifact
    pub captured_slides: usize,
    /// Slides that did not
    pub failed_slides: usize,
    /// Wall-clock duration in milliseconds
    #[serde(rename = "duration_ms")]
    pub duration_ms: u64,
    /// Size of the produced artifact(s) in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl ExportStats {
    /// Stats for a run where every slide was processed.
    pub fn complete(total: usize, duration_ms: u64, file_size: Option<u64>) -> Self {
        Self {
            total_slides: total,
            captured_slides: total,
            failed_slides: 0,
            duration_ms,
            file_size,
        }
    }

    /// Stats for a run where nothing usable was produced.
    pub fn all_failed(total: usize, duration_ms: u64) -> Self {
        Self {
            total_slides: total,
            captured_slides: 0,
            failed_slides: total,
            duration_ms,
            file_size: None,
        }
    }
}

/// Outcome of an export call. Exactly one of success or `error` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    /// Whether the artifact was produced
    pub success: bool,
    /// Counters, present on success and most failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ExportStats>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExportError>,
}

impl ExportResult {
    /// A successful outcome.
    pub fn succeeded(stats: ExportStats) -> Self {
        Self {
            success: true,
            stats: Some(stats),
            error: None,
        }
    }

    /// A failed outcome, optionally with partial stats.
    pub fn failed(error: ExportError, stats: Option<ExportStats>) -> Self {
        Self {
            success: false,
            stats,
            error: Some(error),
        }
    }

    /// Failure kind, if the export failed.
    pub fn error_kind(&self) -> Option<ExportErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Convert into a `Result`, turning failures into [`Error`].
    pub fn into_result(self) -> crate::Result<ExportStats> {
        match (self.success, self.error) {
            (true, _) => Ok(self.stats.unwrap_or_default()),
            (false, Some(error)) => Err(error.into()),
            (false, None) => Err(Error::Export(ExportError::new(
                ExportErrorKind::Unknown,
                "Export failed",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(
            ExportErrorKind::GenerationFailed.to_string(),
            "generation_failed"
        );
        let json = serde_json::to_string(&ExportErrorKind::InvalidOptions).unwrap();
        assert_eq!(json, "\"invalid_options\"");
    }

    #[test]
    fn test_result_envelopes() {
        let ok = ExportResult::succeeded(ExportStats::complete(3, 10, Some(42)));
        assert!(ok.success);
        assert!(ok.error.is_none());
        assert_eq!(ok.clone().into_result().unwrap().captured_slides, 3);

        let failed = ExportResult::failed(
            ExportError::new(ExportErrorKind::GenerationFailed, "zip init"),
            Some(ExportStats::all_failed(3, 5)),
        );
        assert!(!failed.success);
        assert_eq!(failed.error_kind(), Some(ExportErrorKind::GenerationFailed));
        let stats = failed.stats.unwrap();
        assert_eq!(stats.failed_slides, stats.total_slides);
        assert_eq!(stats.captured_slides, 0);
    }

    #[test]
    fn test_error_record_from_error() {
        let err = Error::Capture {
            slide_id: "s2".into(),
            message: "detached".into(),
        };
        let record = ExportError::from(&err);
        assert_eq!(record.kind, ExportErrorKind::CaptureFailed);
        assert_eq!(record.slide_id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_result_json_shape() {
        let result = ExportResult::failed(
            ExportError::new(ExportErrorKind::InvalidOptions, "No slides to export"),
            None,
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["type"], "invalid_options");
        assert!(value.get("stats").is_none());
    }

    #[test]
    fn test_stats_json_keys() {
        let value = serde_json::to_value(ExportStats::complete(3, 12, Some(2048))).unwrap();
        assert_eq!(value["totalSlides"], 3);
        assert_eq!(value["capturedSlides"], 3);
        assert_eq!(value["failedSlides"], 0);
        assert_eq!(value["duration_ms"], 12);
        assert_eq!(value["fileSize"], 2048);
        assert!(value.get("duration").is_none());
    }
}
