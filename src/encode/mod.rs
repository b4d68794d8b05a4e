//! Format encoders.
//!
//! Every encoder turns a list of [`CapturedSlide`]s into one artifact (or, for
//! images, one file per slide) and hands it to a [`DownloadSink`]. They share
//! the [`SlideExporter`] interface and never fail by returning `Err`: every
//! outcome is an [`ExportResult`] envelope.
//!
//! Encoders are all-or-nothing. Any error while building the artifact fails
//! the whole call with `failed_slides == total_slides`.

mod images;
pub mod naming;
mod pdf;
pub mod pptx;
mod raster;

pub use self::images::ImageEncoder;
pub use self::pdf::{fit_image, Orientation, PageSize, PdfConfig, PdfEncoder, Placement};
pub use self::pptx::PptxEncoder;
pub use self::raster::JPEG_QUALITY;

use crate::download::DownloadSink;
use crate::error::Error;
use crate::model::{
    AspectRatio, CapturedSlide, ExportError, ExportFormat, ExportOptions, ExportProgress,
    ExportResult, ExportStats, ExportStatus, ProgressFn, ProgressReporter,
};
use crate::pause::{Pauses, YieldKind, YieldPoint};
use log::warn;
use std::sync::Arc;
use std::time::Instant;

/// Shared interface of the format encoders.
pub trait SlideExporter {
    /// Encode `slides` and deliver the result, reporting progress 0 to 100.
    fn export(
        &self,
        slides: &[CapturedSlide],
        options: &ExportOptions,
        on_progress: &mut ProgressFn<'_>,
    ) -> ExportResult;
}

/// Collaborators the encoders are built from.
#[derive(Clone)]
pub struct EncoderContext {
    /// Where finished files go
    pub sink: Arc<dyn DownloadSink>,
    /// Yield implementation for pauses between downloads
    pub yielder: Arc<dyn YieldPoint>,
    /// Pause durations
    pub pauses: Pauses,
    /// PDF page layout
    pub pdf: PdfConfig,
    /// Aspect ratio used when the options carry none
    pub aspect_ratio: AspectRatio,
}

impl EncoderContext {
    /// Create a context with default pauses, PDF layout and 1920x1080 ratio.
    pub fn new(sink: Arc<dyn DownloadSink>, yielder: Arc<dyn YieldPoint>) -> Self {
        Self {
            sink,
            yielder,
            pauses: Pauses::default(),
            pdf: PdfConfig::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }
}

/// One of the three encoder implementations.
pub enum Encoder {
    /// PNG/JPEG files, one per slide
    Image(ImageEncoder),
    /// Multi-page PDF
    Document(PdfEncoder),
    /// PowerPoint package
    OfficePackage(PptxEncoder),
}

impl Encoder {
    /// Select the encoder for a format.
    pub fn for_format(format: ExportFormat, ctx: &EncoderContext) -> Self {
        match format {
            ExportFormat::Ppt | ExportFormat::Keynote => Encoder::OfficePackage(
                PptxEncoder::new(ctx.sink.clone()).with_aspect_ratio(ctx.aspect_ratio),
            ),
            ExportFormat::Pdf => {
                Encoder::Document(PdfEncoder::new(ctx.sink.clone()).with_config(ctx.pdf))
            }
            ExportFormat::Png | ExportFormat::Jpeg => Encoder::Image(ImageEncoder::new(
                ctx.sink.clone(),
                ctx.yielder.clone(),
                ctx.pauses.duration(YieldKind::BetweenDownloads),
            )),
        }
    }

    /// Short name of the selected encoder.
    pub fn name(&self) -> &'static str {
        match self {
            Encoder::Image(_) => "image",
            Encoder::Document(_) => "pdf",
            Encoder::OfficePackage(_) => "pptx",
        }
    }
}

impl SlideExporter for Encoder {
    fn export(
        &self,
        slides: &[CapturedSlide],
        options: &ExportOptions,
        on_progress: &mut ProgressFn<'_>,
    ) -> ExportResult {
        match self {
            Encoder::Image(encoder) => encoder.export(slides, options, on_progress),
            Encoder::Document(encoder) => encoder.export(slides, options, on_progress),
            Encoder::OfficePackage(encoder) => encoder.export(slides, options, on_progress),
        }
    }
}

/// Milliseconds since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Result for an empty slide list: success, zero stats, nothing saved.
pub(crate) fn empty_success(reporter: &mut ProgressReporter<'_, '_>, start: Instant) -> ExportResult {
    reporter.report(ExportProgress::new(
        0,
        0,
        ExportStatus::Completed,
        "Nothing to export",
        100,
    ));
    ExportResult::succeeded(ExportStats::complete(0, elapsed_ms(start), None))
}

/// Convert an encoder error into an all-failed envelope.
pub(crate) fn encode_failure(
    encoder: &str,
    err: Error,
    total: usize,
    reporter: &mut ProgressReporter<'_, '_>,
    start: Instant,
) -> ExportResult {
    warn!("{} export failed: {}", encoder, err);
    let error = ExportError::from(&err);
    reporter.report(ExportProgress::new(
        0,
        total,
        ExportStatus::Error,
        error.message.clone(),
        reporter.last_percentage(),
    ));
    ExportResult::failed(error, Some(ExportStats::all_failed(total, elapsed_ms(start))))
}
