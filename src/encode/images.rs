//! Image set export: one PNG or JPEG file per slide.

use super::naming::slide_file_name;
use super::raster::{flatten_to_jpeg, JPEG_QUALITY};
use super::{elapsed_ms, empty_success, encode_failure, SlideExporter};
use crate::detect::{detect_bitmap_format, BitmapFormat};
use crate::download::DownloadSink;
use crate::error::Result;
use crate::model::{
    percent_of, CapturedSlide, ExportFormat, ExportOptions, ExportProgress, ExportResult,
    ExportStats, ExportStatus, ProgressFn, ProgressReporter,
};
use crate::pause::{YieldKind, YieldPoint};
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Saves each captured slide as an individual image file.
pub struct ImageEncoder {
    sink: Arc<dyn DownloadSink>,
    yielder: Arc<dyn YieldPoint>,
    between_downloads: Duration,
}

impl ImageEncoder {
    /// Create an image encoder.
    pub fn new(
        sink: Arc<dyn DownloadSink>,
        yielder: Arc<dyn YieldPoint>,
        between_downloads: Duration,
    ) -> Self {
        Self {
            sink,
            yielder,
            between_downloads,
        }
    }

    fn save_all(
        &self,
        slides: &[CapturedSlide],
        options: &ExportOptions,
        reporter: &mut ProgressReporter<'_, '_>,
    ) -> Result<u64> {
        let total = slides.len();
        let base = options.custom_file_name();
        let mut written = 0u64;

        for (i, slide) in slides.iter().enumerate() {
            let (data, format) = encode_slide(slide, options.format)?;
            let name = slide_file_name(base, Some(slide.title()), i, format.extension());

            self.sink.save(&name, format.mime_type(), &data)?;
            written += data.len() as u64;
            debug!("Saved slide {} as {}", slide.id(), name);

            reporter.report(ExportProgress::new(
                i + 1,
                total,
                ExportStatus::Generating,
                format!("Saved {} ({}/{})", name, i + 1, total),
                percent_of(i + 1, total, 100),
            ));

            // Bursts of saves get dropped by download managers.
            if i + 1 < total {
                self.yielder
                    .pause(YieldKind::BetweenDownloads, self.between_downloads);
            }
        }

        Ok(written)
    }
}

/// Bytes and format to write for one slide.
///
/// Only PNG sources are transcoded, and only when JPEG output is requested.
fn encode_slide(slide: &CapturedSlide, format: ExportFormat) -> Result<(Vec<u8>, BitmapFormat)> {
    let bytes = slide.decode_image()?;
    let source = detect_bitmap_format(&bytes)?;

    if format == ExportFormat::Jpeg && source == BitmapFormat::Png {
        let jpeg = flatten_to_jpeg(&bytes, JPEG_QUALITY)?;
        return Ok((jpeg.data, BitmapFormat::Jpeg));
    }
    Ok((bytes, source))
}

impl SlideExporter for ImageEncoder {
    fn export(
        &self,
        slides: &[CapturedSlide],
        options: &ExportOptions,
        on_progress: &mut ProgressFn<'_>,
    ) -> ExportResult {
        let start = Instant::now();
        let total = slides.len();
        let mut reporter = ProgressReporter::new(on_progress);

        if total == 0 {
            return empty_success(&mut reporter, start);
        }

        reporter.report(ExportProgress::new(
            0,
            total,
            ExportStatus::Generating,
            "Preparing images",
            0,
        ));

        match self.save_all(slides, options, &mut reporter) {
            Ok(written) => {
                info!("Exported {} slide images ({} bytes)", total, written);
                reporter.report(ExportProgress::new(
                    total,
                    total,
                    ExportStatus::Completed,
                    "Image export complete",
                    100,
                ));
                ExportResult::succeeded(ExportStats::complete(
                    total,
                    elapsed_ms(start),
                    Some(written),
                ))
            }
            Err(e) => encode_failure("Image", e, total, &mut reporter, start),
        }
    }
}
