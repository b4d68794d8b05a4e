//! Sequential capture over a whole deck.

use super::Rasterizer;
use crate::model::{CapturedSlide, Quality, SlideSurface};
use crate::pause::{YieldKind, YieldPoint};
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// A slide that could not be captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureFailure {
    /// Id of the skipped slide
    pub slide_id: String,
    /// Why it was skipped
    pub message: String,
}

/// Captured slides plus the slides that were skipped.
#[derive(Debug, Clone, Default)]
pub struct CaptureReport {
    /// Successful captures, in input order
    pub slides: Vec<CapturedSlide>,
    /// Skipped slides, in input order
    pub failures: Vec<CaptureFailure>,
}

impl CaptureReport {
    /// Number of slides attempted.
    pub fn attempted(&self) -> usize {
        self.slides.len() + self.failures.len()
    }
}

/// Drives the [`Rasterizer`] across a list of surfaces.
///
/// Surfaces are captured strictly one after another in input order, since
/// every capture moves the shared viewport. A failing slide is logged and
/// skipped, so the output may be shorter than the input.
#[derive(Clone)]
pub struct CaptureOrchestrator {
    rasterizer: Rasterizer,
    yielder: Arc<dyn YieldPoint>,
    between_captures: Duration,
}

impl CaptureOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        rasterizer: Rasterizer,
        yielder: Arc<dyn YieldPoint>,
        between_captures: Duration,
    ) -> Self {
        Self {
            rasterizer,
            yielder,
            between_captures,
        }
    }

    /// Capture every surface, reporting `(attempted, total)` after each one.
    pub fn capture_slides(
        &self,
        surfaces: &[SlideSurface],
        quality: Quality,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Vec<CapturedSlide> {
        self.capture_with_report(surfaces, quality, on_progress)
            .slides
    }

    /// Like [`capture_slides`](Self::capture_slides), also returning the skipped slides.
    pub fn capture_with_report(
        &self,
        surfaces: &[SlideSurface],
        quality: Quality,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> CaptureReport {
        let total = surfaces.len();
        let mut report = CaptureReport::default();

        for (i, surface) in surfaces.iter().enumerate() {
            match self.rasterizer.capture(surface, quality) {
                Ok(slide) => report.slides.push(slide),
                Err(e) => {
                    warn!("Skipping slide {}: {}", surface.id, e);
                    report.failures.push(CaptureFailure {
                        slide_id: surface.id.clone(),
                        message: e.to_string(),
                    });
                }
            }

            on_progress(i + 1, total);

            // Let the renderer release the previous surface.
            if i + 1 < total {
                self.yielder
                    .pause(YieldKind::BetweenCaptures, self.between_captures);
            }
        }

        debug!(
            "Captured {}/{} slides ({} skipped)",
            report.slides.len(),
            total,
            report.failures.len()
        );
        report
    }
}
