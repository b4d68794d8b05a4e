//! PowerPoint export: a hand-built Office Open XML presentation package with
//! one full-bleed picture per slide.
//!
//! The package is assembled part by part ([`PackageBuilder`]) and written with
//! the `zip` crate. Only the shared master, layout and theme are emitted once;
//! every slide gets its own slide part, relationship part and PNG media part.

mod package;
mod parts;

pub use self::package::{PackageBuilder, PackagePart, PresentationPackage};
pub use self::parts::rel_type;

use super::naming::document_file_name;
use super::raster::ensure_png;
use super::{elapsed_ms, encode_failure, SlideExporter};
use crate::download::{DownloadSink, PPTX_MIME};
use crate::error::Result;
use crate::model::{
    percent_of, AspectRatio, CapturedSlide, ExportFormat, ExportOptions, ExportProgress, ExportResult,
    ExportStats, ExportStatus, ProgressFn, ProgressReporter,
};
use chrono::{Local, Utc};
use log::info;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// English Metric Units per inch.
pub const EMU_PER_INCH: u64 = 914_400;

/// Slide width used for every deck (10 inches).
pub const BASE_WIDTH_EMU: u64 = 9_144_000;

/// First `p:sldId` value; ids below 256 are reserved.
pub const FIRST_SLIDE_ID: u32 = 256;

/// Slide dimensions in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideSize {
    /// Width
    pub cx: u64,
    /// Height
    pub cy: u64,
}

impl SlideSize {
    /// Size for an aspect ratio at the base width.
    ///
    /// A degenerate ratio falls back to 1920x1080.
    pub fn from_aspect_ratio(ratio: AspectRatio) -> Self {
        let ratio = if ratio.validate().is_ok() {
            ratio
        } else {
            AspectRatio::default()
        };
        let cy = (BASE_WIDTH_EMU as f64 * ratio.height as f64 / ratio.width as f64).round();
        Self {
            cx: BASE_WIDTH_EMU,
            cy: cy as u64,
        }
    }

    /// Width and height in inches.
    pub fn inches(&self) -> (f64, f64) {
        (
            self.cx as f64 / EMU_PER_INCH as f64,
            self.cy as f64 / EMU_PER_INCH as f64,
        )
    }
}

impl Default for SlideSize {
    fn default() -> Self {
        Self::from_aspect_ratio(AspectRatio::default())
    }
}

/// Writes a `.pptx` presentation.
pub struct PptxEncoder {
    sink: Arc<dyn DownloadSink>,
    aspect_ratio: AspectRatio,
}

impl PptxEncoder {
    /// Create a PPTX encoder with a 1920x1080 slide shape.
    pub fn new(sink: Arc<dyn DownloadSink>) -> Self {
        Self {
            sink,
            aspect_ratio: AspectRatio::default(),
        }
    }

    /// Aspect ratio used when the export options carry none.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Build the package for `slides` without writing it anywhere.
    pub fn build_package(
        &self,
        slides: &[CapturedSlide],
        options: &ExportOptions,
        reporter: &mut ProgressReporter<'_, '_>,
    ) -> Result<PresentationPackage> {
        let total = slides.len();
        let ratio = options.aspect_ratio.unwrap_or(self.aspect_ratio);
        let title = options.custom_file_name().unwrap_or("Presentation");
        let mut builder = PackageBuilder::new(SlideSize::from_aspect_ratio(ratio)).with_title(title);

        for (i, slide) in slides.iter().enumerate() {
            let png = ensure_png(slide.decode_image()?)?;
            builder.add_slide(png, slide.title());

            reporter.report(ExportProgress::new(
                i + 1,
                total,
                ExportStatus::Generating,
                format!("Adding slide {}/{}", i + 1, total),
                percent_of(i + 1, total, 90),
            ));
        }

        Ok(builder.finish(Utc::now()))
    }
}

impl SlideExporter for PptxEncoder {
    fn export(
        &self,
        slides: &[CapturedSlide],
        options: &ExportOptions,
        on_progress: &mut ProgressFn<'_>,
    ) -> ExportResult {
        let start = Instant::now();
        let total = slides.len();
        let mut reporter = ProgressReporter::new(on_progress);

        reporter.report(ExportProgress::new(
            0,
            total,
            ExportStatus::Generating,
            "Generating presentation structure",
            0,
        ));

        let file_name = document_file_name(
            options.custom_file_name(),
            ExportFormat::Ppt.extension(),
            Local::now().date_naive(),
        );

        let outcome = self
            .build_package(slides, options, &mut reporter)
            .and_then(|package| {
                reporter.report(ExportProgress::new(
                    total,
                    total,
                    ExportStatus::Generating,
                    "Packaging presentation",
                    95,
                ));
                package.write_archive()
            })
            .and_then(|bytes| {
                self.sink.save(&file_name, PPTX_MIME, &bytes)?;
                Ok(bytes.len() as u64)
            });

        match outcome {
            Ok(size) => {
                info!("Exported {} slides to {} ({} bytes)", total, file_name, size);
                reporter.report(ExportProgress::new(
                    total,
                    total,
                    ExportStatus::Completed,
                    "Presentation export complete",
                    100,
                ));
                ExportResult::succeeded(ExportStats::complete(
                    total,
                    elapsed_ms(start),
                    Some(size),
                ))
            }
            Err(e) => encode_failure("PPTX", e, total, &mut reporter, start),
        }
    }
}
