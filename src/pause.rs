//! Named yield points between pipeline steps.
//!
//! Rendering and saving hand control back to the host between steps: after a
//! surface is scrolled into view, between captures, and between downloads.
//! The wait itself goes through a [`YieldPoint`] so tests can skip it.

use std::fmt;
use std::time::Duration;

/// Where in the pipeline a yield happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YieldKind {
    /// After scrolling a surface into view, before rasterizing it
    Settle,
    /// Between two slide captures
    BetweenCaptures,
    /// Between two individual file saves
    BetweenDownloads,
}

impl fmt::Display for YieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            YieldKind::Settle => "settle",
            YieldKind::BetweenCaptures => "between-captures",
            YieldKind::BetweenDownloads => "between-downloads",
        };
        f.write_str(name)
    }
}

/// Gives control back to the host for a while.
pub trait YieldPoint: Send + Sync {
    /// Pause at `kind` for up to `duration`.
    fn pause(&self, kind: YieldKind, duration: Duration);
}

/// Blocks the current thread for the requested duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepYield;

impl YieldPoint for SleepYield {
    fn pause(&self, _kind: YieldKind, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

impl YieldPoint for NoYield {
    fn pause(&self, _kind: YieldKind, _duration: Duration) {}
}

/// Durations for each yield point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pauses {
    /// After scroll-into-view
    pub settle: Duration,
    /// Between captures
    pub between_captures: Duration,
    /// Between downloads
    pub between_downloads: Duration,
}

impl Pauses {
    /// Zero-length pauses.
    pub const fn none() -> Self {
        Self {
            settle: Duration::ZERO,
            between_captures: Duration::ZERO,
            between_downloads: Duration::ZERO,
        }
    }

    /// Duration configured for a yield point.
    pub fn duration(&self, kind: YieldKind) -> Duration {
        match kind {
            YieldKind::Settle => self.settle,
            YieldKind::BetweenCaptures => self.between_captures,
            YieldKind::BetweenDownloads => self.between_downloads,
        }
    }
}

impl Default for Pauses {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            between_captures: Duration::from_millis(50),
            between_downloads: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_default_pauses() {
        let pauses = Pauses::default();
        assert_eq!(pauses.duration(YieldKind::Settle), Duration::from_millis(100));
        assert_eq!(
            pauses.duration(YieldKind::BetweenCaptures),
            Duration::from_millis(50)
        );
        assert_eq!(Pauses::none().duration(YieldKind::BetweenDownloads), Duration::ZERO);
    }

    #[test]
    fn test_sleep_yield_waits() {
        let start = Instant::now();
        SleepYield.pause(YieldKind::Settle, Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_yield_kind_display() {
        assert_eq!(YieldKind::BetweenDownloads.to_string(), "between-downloads");
    }
}
