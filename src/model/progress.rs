//! Export progress snapshots and the monotonic reporter.

use serde::{Deserialize, Serialize};

/// Stage of an export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    /// Nothing running
    #[default]
    Idle,
    /// Validating input
    Preparing,
    /// Rasterizing slides
    Capturing,
    /// Encoding the artifact
    Generating,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Error,
    /// Stopped on request
    Cancelled,
}

/// A snapshot of export progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportProgress {
    /// Steps done
    pub current: usize,
    /// Total steps
    pub total: usize,
    /// Current stage
    pub status: ExportStatus,
    /// Human-readable description
    pub message: String,
    /// Overall completion, 0 to 100
    pub percentage: u8,
}

impl ExportProgress {
    /// Create a progress snapshot. Percentages above 100 are clamped.
    pub fn new(
        current: usize,
        total: usize,
        status: ExportStatus,
        message: impl Into<String>,
        percentage: u8,
    ) -> Self {
        Self {
            current,
            total,
            status,
            message: message.into(),
            percentage: percentage.min(100),
        }
    }
}

/// Observer signature for progress updates.
pub type ProgressFn<'a> = dyn FnMut(&ExportProgress) + 'a;

/// `round(done / total * scale)`, with an empty total counting as complete.
pub fn percent_of(done: usize, total: usize, scale: u32) -> u8 {
    if total == 0 {
        return scale.min(100) as u8;
    }
    let value = (done as f64 / total as f64 * scale as f64).round();
    value.clamp(0.0, 100.0) as u8
}

/// Forwards progress to an observer while keeping percentages non-decreasing.
pub struct ProgressReporter<'r, 'f> {
    observer: &'r mut ProgressFn<'f>,
    floor: u8,
}

impl<'r, 'f> ProgressReporter<'r, 'f> {
    /// Wrap an observer.
    pub fn new(observer: &'r mut ProgressFn<'f>) -> Self {
        Self { observer, floor: 0 }
    }

    /// Report a snapshot, raising its percentage to the highest seen so far.
    pub fn report(&mut self, mut progress: ExportProgress) {
        if progress.percentage < self.floor {
            progress.percentage = self.floor;
        }
        self.floor = progress.percentage;
        (self.observer)(&progress);
    }

    /// Highest percentage reported so far.
    pub fn last_percentage(&self) -> u8 {
        self.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(1, 3, 100), 33);
        assert_eq!(percent_of(2, 3, 100), 67);
        assert_eq!(percent_of(3, 3, 50), 50);
        assert_eq!(percent_of(0, 0, 100), 100);
    }

    #[test]
    fn test_progress_clamped() {
        let progress = ExportProgress::new(1, 1, ExportStatus::Completed, "done", 140);
        assert_eq!(progress.percentage, 100);
    }

    #[test]
    fn test_reporter_is_monotonic() {
        let mut seen = Vec::new();
        let mut observer = |p: &ExportProgress| seen.push(p.percentage);
        {
            let mut reporter = ProgressReporter::new(&mut observer);
            reporter.report(ExportProgress::new(0, 2, ExportStatus::Capturing, "", 10));
            reporter.report(ExportProgress::new(1, 2, ExportStatus::Capturing, "", 5));
            reporter.report(ExportProgress::new(2, 2, ExportStatus::Completed, "", 100));
            assert_eq!(reporter.last_percentage(), 100);
        }
        assert_eq!(seen, vec![10, 10, 100]);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ExportStatus::Generating).unwrap();
        assert_eq!(json, "\"generating\"");
    }
}
