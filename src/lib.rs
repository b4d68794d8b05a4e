//! # deckport
//!
//! Slide deck export: capture rendered slides and package them as a
//! PowerPoint presentation, a PDF, or a set of PNG/JPEG images.
//!
//! The pipeline has four stages:
//!
//! 1. a [`Rasterizer`] turns one slide surface into a bitmap,
//! 2. the [`CaptureOrchestrator`] runs it over the deck, skipping slides
//!    that fail,
//! 3. a format encoder ([`PptxEncoder`], [`PdfEncoder`], [`ImageEncoder`])
//!    builds the artifact and hands it to a [`DownloadSink`],
//! 4. the [`ExportCoordinator`] ties it together with one progress scale and
//!    one result envelope.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deckport::{export_files, ExportFormat, ExportOptions};
//!
//! // Each image is one pre-rendered slide.
//! let options = ExportOptions::new(ExportFormat::Ppt).with_file_name("quarterly");
//! let stats = export_files(&["intro.png", "numbers.png"], &options, "out")?;
//! println!("{} slides, {:?} bytes", stats.captured_slides, stats.file_size);
//! # Ok::<(), deckport::Error>(())
//! ```
//!
//! ## Custom Backends
//!
//! ```no_run
//! use std::sync::Arc;
//! use deckport::{
//!     ExportCoordinator, ExportFormat, ExportOptions, ImageFileBackend, MemorySink,
//!     SleepYield, SlideSurface, SurfaceHandle,
//! };
//!
//! let sink = Arc::new(MemorySink::new());
//! let coordinator = ExportCoordinator::new(
//!     Arc::new(ImageFileBackend::new()),
//!     sink.clone(),
//!     Arc::new(SleepYield),
//! );
//! let slides = vec![SlideSurface::new("intro", 0, SurfaceHandle::new("intro.png"))];
//! let result = coordinator.export(&slides, &ExportOptions::new(ExportFormat::Pdf), &mut |p| {
//!     println!("{:>3}% {}", p.percentage, p.message);
//! });
//! assert!(result.success);
//! ```

pub mod capture;
pub mod container;
pub mod coordinator;
pub mod detect;
pub mod download;
pub mod encode;
pub mod error;
pub mod model;
pub mod pause;
pub mod registry;

#[cfg(test)]
mod testing;

// Re-exports
pub use capture::{
    CaptureFailure, CaptureOrchestrator, CaptureReport, ImageFileBackend, Rasterizer,
    RenderBackend,
};
pub use container::{verify_presentation, OoxmlContainer, PresentationSummary};
pub use coordinator::{CoordinatorConfig, ExportCoordinator};
pub use download::{DirectorySink, DownloadSink, MemorySink};
pub use encode::{
    Encoder, ImageEncoder, Orientation, PageSize, PdfConfig, PdfEncoder, PptxEncoder,
    SlideExporter,
};
pub use error::{Error, Result};
pub use model::{
    AspectRatio, CapturedSlide, ExportError, ExportErrorKind, ExportFormat, ExportOptions,
    ExportProgress, ExportResult, ExportStats, ExportStatus, Quality, SlideRecord, SlideSurface,
    SurfaceHandle,
};
pub use pause::{NoYield, Pauses, SleepYield, YieldKind, YieldPoint};
pub use registry::SurfaceRegistry;

use std::path::Path;
use std::sync::Arc;

/// Build slide surfaces from pre-rendered slide images.
///
/// The slide id is the file stem. With `titles`, the stem is also used as
/// the slide title, which image exports put into file names.
///
/// # Example
///
/// ```
/// use deckport::surfaces_from_paths;
///
/// let surfaces = surfaces_from_paths(&["slides/intro.png"], true);
/// assert_eq!(surfaces[0].id, "intro");
/// assert_eq!(surfaces[0].title.as_deref(), Some("intro"));
/// ```
pub fn surfaces_from_paths<P: AsRef<Path>>(paths: &[P], titles: bool) -> Vec<SlideSurface> {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let path = path.as_ref();
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("slide-{}", index + 1));
            let surface = SlideSurface::new(id.clone(), index, SurfaceHandle::new(path));
            if titles {
                surface.with_title(id)
            } else {
                surface
            }
        })
        .collect()
}

/// Export pre-rendered slide images into `out_dir`.
///
/// Uses [`ImageFileBackend`], a [`DirectorySink`] and real pauses; see
/// [`ExportCoordinator`] for anything more specific.
pub fn export_files<P: AsRef<Path>>(
    paths: &[P],
    options: &ExportOptions,
    out_dir: impl AsRef<Path>,
) -> Result<ExportStats> {
    let coordinator = ExportCoordinator::new(
        Arc::new(ImageFileBackend::new()),
        Arc::new(DirectorySink::new(out_dir.as_ref())),
        Arc::new(SleepYield),
    );
    coordinator.execute_export(&surfaces_from_paths(paths, false), options, &mut |_| {})
}
