//! PDF export: one page per slide, image fitted into the printable area.

use super::naming::document_file_name;
use super::raster::{flatten_to_jpeg, JPEG_QUALITY};
use super::{elapsed_ms, empty_success, encode_failure, SlideExporter};
use crate::download::{DownloadSink, PDF_MIME};
use crate::error::Result;
use crate::model::{
    percent_of, CapturedSlide, ExportFormat, ExportOptions, ExportProgress, ExportResult,
    ExportStats, ExportStatus, ProgressFn, ProgressReporter,
};
use chrono::{DateTime, Local, Utc};
use log::{debug, info};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

/// Paper size in PDF points (1/72 inch), portrait.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PageSize {
    /// ISO A4, 210 x 297 mm
    #[default]
    A4,
    /// US Letter, 8.5 x 11 in
    Letter,
    /// Arbitrary width and height in points
    Custom {
        /// Width in points
        width: f32,
        /// Height in points
        height: f32,
    },
}

impl PageSize {
    /// Portrait `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match *self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Taller than wide
    Portrait,
    /// Wider than tall
    #[default]
    Landscape,
}

/// PDF page layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfConfig {
    /// Paper size
    pub page_size: PageSize,
    /// Orientation applied to the paper size
    pub orientation: Orientation,
    /// Margin on every side, in points
    pub margin: f32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Landscape,
            margin: 20.0,
        }
    }
}

impl PdfConfig {
    /// Set the paper size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the margin in points.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Oriented `(width, height)` in points.
    pub fn page_dimensions(&self) -> (f32, f32) {
        let (w, h) = self.page_size.dimensions();
        let (short, long) = (w.min(h), w.max(h));
        match self.orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        }
    }
}

/// Where an image lands on a page, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Drawn width
    pub width: f32,
    /// Drawn height
    pub height: f32,
}

/// Fit an image into the page's printable area, preserving its aspect ratio
/// and centring it on both axes.
pub fn fit_image(image_width: u32, image_height: u32, config: &PdfConfig) -> Placement {
    let (page_width, page_height) = config.page_dimensions();
    let area_width = (page_width - 2.0 * config.margin).max(1.0);
    let area_height = (page_height - 2.0 * config.margin).max(1.0);

    let image_ratio = image_width.max(1) as f32 / image_height.max(1) as f32;
    let area_ratio = area_width / area_height;

    let (width, height) = if image_ratio > area_ratio {
        (area_width, area_width / image_ratio)
    } else {
        (area_height * image_ratio, area_height)
    };

    Placement {
        x: config.margin + (area_width - width) / 2.0,
        y: config.margin + (area_height - height) / 2.0,
        width,
        height,
    }
}

/// Writes a multi-page PDF document.
pub struct PdfEncoder {
    sink: Arc<dyn DownloadSink>,
    config: PdfConfig,
}

impl PdfEncoder {
    /// Create a PDF encoder with the default layout (A4 landscape).
    pub fn new(sink: Arc<dyn DownloadSink>) -> Self {
        Self {
            sink,
            config: PdfConfig::default(),
        }
    }

    /// Use a different page layout.
    pub fn with_config(mut self, config: PdfConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the PDF bytes for `slides`.
    pub fn render(
        &self,
        slides: &[CapturedSlide],
        title: &str,
        reporter: &mut ProgressReporter<'_, '_>,
    ) -> Result<Vec<u8>> {
        let total = slides.len();
        let mut writer = PdfWriter::new(self.config.page_dimensions());

        for (i, slide) in slides.iter().enumerate() {
            let jpeg = flatten_to_jpeg(&slide.decode_image()?, JPEG_QUALITY)?;
            let placement = fit_image(jpeg.width, jpeg.height, &self.config);
            debug!(
                "PDF page {} for slide {}: {:.1}x{:.1} at ({:.1}, {:.1})",
                i + 1,
                slide.id(),
                placement.width,
                placement.height,
                placement.x,
                placement.y
            );
            writer.add_image_page(jpeg.data, jpeg.width, jpeg.height, placement);

            reporter.report(ExportProgress::new(
                i + 1,
                total,
                ExportStatus::Generating,
                format!("Adding page {}/{}", i + 1, total),
                percent_of(i + 1, total, 90),
            ));
        }

        reporter.report(ExportProgress::new(
            total,
            total,
            ExportStatus::Generating,
            "Writing PDF",
            95,
        ));
        Ok(writer.finish(title, Utc::now()))
    }
}

impl SlideExporter for PdfEncoder {
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
            "Preparing document",
            0,
        ));

        let file_name = document_file_name(
            options.custom_file_name(),
            ExportFormat::Pdf.extension(),
            Local::now().date_naive(),
        );
        let title = options.custom_file_name().unwrap_or("Presentation");

        let outcome = self
            .render(slides, title, &mut reporter)
            .and_then(|bytes| {
                self.sink.save(&file_name, PDF_MIME, &bytes)?;
                Ok(bytes.len() as u64)
            });

        match outcome {
            Ok(size) => {
                info!("Exported {} pages to {} ({} bytes)", total, file_name, size);
                reporter.report(ExportProgress::new(
                    total,
                    total,
                    ExportStatus::Completed,
                    "PDF export complete",
                    100,
                ));
                ExportResult::succeeded(ExportStats::complete(
                    total,
                    elapsed_ms(start),
                    Some(size),
                ))
            }
            Err(e) => encode_failure("PDF", e, total, &mut reporter, start),
        }
    }
}

/// Minimal PDF 1.4 serializer for image-per-page documents.
///
/// Object layout: 1 catalog, 2 page tree, 3 info, then a page, its content
/// stream and its image XObject for every slide.
pub(crate) struct PdfWriter {
    page_width: f32,
    page_height: f32,
    pages: Vec<ImagePage>,
}

struct ImagePage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    placement: Placement,
}

const FIRST_PAGE_OBJECT: usize = 4;

impl PdfWriter {
    pub(crate) fn new((page_width, page_height): (f32, f32)) -> Self {
        Self {
            page_width,
            page_height,
            pages: Vec::new(),
        }
    }

    pub(crate) fn add_image_page(&mut self, jpeg: Vec<u8>, width: u32, height: u32, placement: Placement) {
        self.pages.push(ImagePage {
            jpeg,
            width,
            height,
            placement,
        });
    }

    fn page_object(index: usize) -> usize {
        FIRST_PAGE_OBJECT + index * 3
    }

    pub(crate) fn finish(self, title: &str, created: DateTime<Utc>) -> Vec<u8> {
        let object_count = FIRST_PAGE_OBJECT - 1 + self.pages.len() * 3;
        let mut out: Vec<u8> = Vec::new();
        let mut offsets = vec![0usize; object_count + 1];

        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        offsets[1] = out.len();
        push_object(&mut out, 1, "<< /Type /Catalog /Pages 2 0 R >>");

        let kids = (0..self.pages.len())
            .map(|i| format!("{} 0 R", Self::page_object(i)))
            .collect::<Vec<_>>()
            .join(" ");
        offsets[2] = out.len();
        push_object(
            &mut out,
            2,
            &format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, self.pages.len()),
        );

        offsets[3] = out.len();
        push_object(
            &mut out,
            3,
            &format!(
                "<< /Title {} /Producer (deckport {}) /CreationDate (D:{}Z) >>",
                pdf_text(title),
                env!("CARGO_PKG_VERSION"),
                created.format("%Y%m%d%H%M%S")
            ),
        );

        for (i, page) in self.pages.iter().enumerate() {
            let page_id = Self::page_object(i);
            let content_id = page_id + 1;
            let image_id = page_id + 2;

            offsets[page_id] = out.len();
            push_object(
                &mut out,
                page_id,
                &format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /XObject << /Im{} {} 0 R >> >> /Contents {} 0 R >>",
                    number(self.page_width),
                    number(self.page_height),
                    i + 1,
                    image_id,
                    content_id
                ),
            );

            let p = page.placement;
            let content = format!(
                "q\n{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
                number(p.width),
                number(p.height),
                number(p.x),
                number(p.y),
                i + 1
            );
            offsets[content_id] = out.len();
            push_stream(
                &mut out,
                content_id,
                &format!("<< /Length {} >>", content.len()),
                content.as_bytes(),
            );

            offsets[image_id] = out.len();
            push_stream(
                &mut out,
                image_id,
                &format!(
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>",
                    page.width,
                    page.height,
                    page.jpeg.len()
                ),
                &page.jpeg,
            );
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", object_count + 1);
        for offset in &offsets[1..] {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 3 0 R >>\nstartxref\n{}\n%%EOF\n",
            object_count + 1,
            xref_offset
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

fn push_object(out: &mut Vec<u8>, id: usize, body: &str) {
    out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
}

fn push_stream(out: &mut Vec<u8>, id: usize, dict: &str, data: &[u8]) {
    out.extend_from_slice(format!("{} 0 obj\n{}\nstream\n", id, dict).as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream\nendobj\n");
}

/// Format a coordinate with at most two decimals.
fn number(value: f32) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Encode a text string: literal for ASCII, UTF-16BE hex otherwise.
fn pdf_text(text: &str) -> String {
    if text.is_ascii() {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('(');
        for c in text.chars() {
            if matches!(c, '(' | ')' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push(')');
        return out;
    }
    let mut out = String::from("<FEFF");
    for unit in text.encode_utf16() {
        let _ = write!(out, "{:04X}", unit);
    }
    out.push('>');
    out
}
