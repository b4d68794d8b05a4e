//! Top-level export entry point.
//!
//! The coordinator validates the request, captures the selected slides,
//! hands the captures to the encoder for the requested format, and folds
//! both phases into one 0 to 100 progress scale: capture fills 0..=50 and
//! encoding `50 + round(p / 2)`.

use crate::capture::{CaptureOrchestrator, CaptureReport, Rasterizer, RenderBackend};
use crate::download::DownloadSink;
use crate::encode::{Encoder, EncoderContext, PdfConfig, SlideExporter};
use crate::error::{Error, Result};
use crate::model::{
    percent_of, AspectRatio, ExportError, ExportErrorKind, ExportOptions, ExportProgress,
    ExportResult, ExportStats, ExportStatus, ProgressFn, ProgressReporter, SlideSurface,
};
use crate::pause::{Pauses, YieldKind, YieldPoint};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Coordinator settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinatorConfig {
    /// Aspect ratio when the options carry none
    pub default_aspect_ratio: AspectRatio,
    /// Yield durations
    pub pauses: Pauses,
    /// PDF page layout
    pub pdf: PdfConfig,
}

impl CoordinatorConfig {
    /// Set the fallback aspect ratio.
    pub fn with_default_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.default_aspect_ratio = ratio;
        self
    }

    /// Set the yield durations.
    pub fn with_pauses(mut self, pauses: Pauses) -> Self {
        self.pauses = pauses;
        self
    }

    /// Set the PDF page layout.
    pub fn with_pdf(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }
}

/// Runs whole exports, one at a time.
pub struct ExportCoordinator {
    orchestrator: CaptureOrchestrator,
    encoders: EncoderContext,
    state: ExportState,
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLING: u8 = 2;

/// Lifecycle of the current export. A cancel request only moves `RUNNING` to
/// `CANCELLING`, and ending an export always returns to `IDLE`.
struct ExportState(AtomicU8);

impl ExportState {
    fn new() -> Self {
        Self(AtomicU8::new(IDLE))
    }

    fn begin(&self) -> Option<RunGuard<'_>> {
        self.0
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(self))
    }

    fn request_cancel(&self) -> bool {
        self.0
            .compare_exchange(RUNNING, CANCELLING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire) != IDLE
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire) == CANCELLING
    }

    fn finish(&self) {
        self.0.store(IDLE, Ordering::Release);
    }
}

/// Returns the state to idle when an export ends, however it ends.
struct RunGuard<'a>(&'a ExportState);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

impl ExportCoordinator {
    /// Create a coordinator with default settings.
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        sink: Arc<dyn DownloadSink>,
        yielder: Arc<dyn YieldPoint>,
    ) -> Self {
        Self::from_config(CoordinatorConfig::default(), backend, sink, yielder)
    }

    /// Create a coordinator with explicit settings.
    pub fn from_config(
        config: CoordinatorConfig,
        backend: Arc<dyn RenderBackend>,
        sink: Arc<dyn DownloadSink>,
        yielder: Arc<dyn YieldPoint>,
    ) -> Self {
        let pauses = config.pauses;
        let rasterizer =
            Rasterizer::new(backend, yielder.clone(), pauses.duration(YieldKind::Settle));
        let orchestrator = CaptureOrchestrator::new(
            rasterizer,
            yielder.clone(),
            pauses.duration(YieldKind::BetweenCaptures),
        );

        let mut encoders = EncoderContext::new(sink, yielder);
        encoders.pauses = config.pauses;
        encoders.pdf = config.pdf;
        encoders.aspect_ratio = config.default_aspect_ratio;

        Self {
            orchestrator,
            encoders,
            state: ExportState::new(),
        }
    }

    /// Whether an export is running on this coordinator.
    pub fn is_exporting(&self) -> bool {
        self.state.is_running()
    }

    /// Ask the running export to stop at its next phase boundary.
    ///
    /// A slide already being captured finishes first. Has no effect when
    /// nothing is running.
    pub fn cancel(&self) {
        if self.state.request_cancel() {
            info!("Export cancellation requested");
        }
    }

    /// Export `slides` and return the outcome envelope. Never panics or
    /// returns an error; every failure is described in the result.
    pub fn export(
        &self,
        slides: &[SlideSurface],
        options: &ExportOptions,
        on_progress: &mut ProgressFn<'_>,
    ) -> ExportResult {
        let mut reporter = ProgressReporter::new(on_progress);

        let Some(_guard) = self.state.begin() else {
            warn!("Rejected export: another export is in progress");
            return invalid(&mut reporter, "An export is already in progress");
        };

        let start = Instant::now();
        reporter.report(ExportProgress::new(
            0,
            slides.len(),
            ExportStatus::Preparing,
            "Preparing export",
            0,
        ));

        if let Some(Err(e)) = options.aspect_ratio.map(|r| r.validate()) {
            return invalid(&mut reporter, &e.to_string());
        }

        let selected = select_slides(slides, &options.selected_slide_ids);
        if selected.is_empty() {
            return invalid(&mut reporter, "No slides to export");
        }
        let total = selected.len();
        info!(
            "Exporting {} of {} slides as {} ({:?} quality)",
            total,
            slides.len(),
            options.format,
            options.quality
        );

        if self.is_cancelled() {
            return cancelled(&mut reporter, ExportStats {
                total_slides: total,
                duration_ms: elapsed(start),
                ..Default::default()
            });
        }

        let report = self.capture(&selected, options, &mut reporter);
        let captured = report.slides.len();
        info!(
            "Captured {} of {} attempted slides",
            captured,
            report.attempted()
        );

        if captured == 0 {
            return capture_failed(&mut reporter, &report, total, elapsed(start));
        }

        let partial = ExportStats {
            total_slides: total,
            captured_slides: captured,
            failed_slides: total - captured,
            duration_ms: elapsed(start),
            file_size: None,
        };
        if self.is_cancelled() {
            return cancelled(&mut reporter, partial);
        }

        let encoder = Encoder::for_format(options.format, &self.encoders);
        let outcome = encoder.export(&report.slides, options, &mut |p: &ExportProgress| {
            let status = match p.status {
                ExportStatus::Completed | ExportStatus::Error => ExportStatus::Generating,
                other => other,
            };
            reporter.report(ExportProgress::new(
                p.current,
                p.total,
                status,
                p.message.clone(),
                encode_percentage(p.percentage),
            ));
        });

        if !outcome.success {
            let error = outcome
                .error
                .map(|mut e| {
                    if e.message.trim().is_empty() {
                        e.message = "Export failed".to_string();
                    }
                    e
                })
                .unwrap_or_else(|| ExportError::new(ExportErrorKind::Unknown, "Export failed"));
            warn!("Export failed during {} encoding: {}", encoder.name(), error.message);
            reporter.report(ExportProgress::new(
                0,
                total,
                ExportStatus::Error,
                error.message.clone(),
                reporter.last_percentage(),
            ));
            return ExportResult::failed(
                error,
                Some(ExportStats::all_failed(total, elapsed(start))),
            );
        }

        let stats = ExportStats {
            duration_ms: elapsed(start),
            file_size: outcome.stats.and_then(|s| s.file_size),
            ..partial
        };
        info!(
            "Export finished: {}/{} slides in {} ms",
            stats.captured_slides, stats.total_slides, stats.duration_ms
        );
        reporter.report(ExportProgress::new(
            total,
            total,
            ExportStatus::Completed,
            "Export complete",
            100,
        ));
        ExportResult::succeeded(stats)
    }

    /// Export and turn a failed envelope into an error.
    pub fn execute_export(
        &self,
        slides: &[SlideSurface],
        options: &ExportOptions,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<ExportStats> {
        self.export(slides, options, on_progress).into_result()
    }

    fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    fn capture(
        &self,
        slides: &[SlideSurface],
        options: &ExportOptions,
        reporter: &mut ProgressReporter<'_, '_>,
    ) -> CaptureReport {
        reporter.report(ExportProgress::new(
            0,
            slides.len(),
            ExportStatus::Capturing,
            "Capturing slides",
            0,
        ));
        self.orchestrator
            .capture_with_report(slides, options.quality, &mut |current, total| {
                reporter.report(ExportProgress::new(
                    current,
                    total,
                    ExportStatus::Capturing,
                    format!("Captured slide {}/{}", current, total),
                    percent_of(current, total, 50),
                ));
            })
    }
}

/// Keep slides whose id is selected, in deck order. No selection keeps all.
fn select_slides(slides: &[SlideSurface], selected: &[String]) -> Vec<SlideSurface> {
    if selected.is_empty() {
        return slides.to_vec();
    }
    let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
    slides
        .iter()
        .filter(|s| wanted.contains(s.id.as_str()))
        .cloned()
        .collect()
}

/// Map an encoder percentage onto the second half of the scale.
fn encode_percentage(p: u8) -> u8 {
    50 + (f64::from(p.min(100)) / 2.0).round() as u8
}

fn elapsed(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn invalid(reporter: &mut ProgressReporter<'_, '_>, message: &str) -> ExportResult {
    let error = ExportError::from(&Error::InvalidOptions(message.to_string()));
    reporter.report(ExportProgress::new(
        0,
        0,
        ExportStatus::Error,
        message,
        reporter.last_percentage(),
    ));
    ExportResult::failed(error, None)
}

fn cancelled(reporter: &mut ProgressReporter<'_, '_>, stats: ExportStats) -> ExportResult {
    info!(
        "Export cancelled after capturing {}/{} slides",
        stats.captured_slides, stats.total_slides
    );
    reporter.report(ExportProgress::new(
        stats.captured_slides,
        stats.total_slides,
        ExportStatus::Cancelled,
        "Export cancelled",
        reporter.last_percentage(),
    ));
    ExportResult::failed(ExportError::from(&Error::Cancelled), Some(stats))
}

fn capture_failed(
    reporter: &mut ProgressReporter<'_, '_>,
    report: &CaptureReport,
    total: usize,
    duration_ms: u64,
) -> ExportResult {
    let mut error = ExportError::new(ExportErrorKind::CaptureFailed, "Failed to capture any slides");
    if let Some(first) = report.failures.first() {
        error = error.with_slide_id(first.slide_id.clone());
    }
    let details: Vec<String> = report
        .failures
        .iter()
        .map(|f| format!("{}: {}", f.slide_id, f.message))
        .collect();
    if !details.is_empty() {
        error = error.with_details(details.join("; "));
    }

    warn!("Export failed: no slide out of {} could be captured", total);
    reporter.report(ExportProgress::new(
        0,
        total,
        ExportStatus::Error,
        error.message.clone(),
        reporter.last_percentage(),
    ));
    ExportResult::failed(error, Some(ExportStats::all_failed(total, duration_ms)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::MemorySink;
    use crate::model::{ExportFormat, SurfaceHandle};
    use crate::pause::{NoYield, YieldKind};
    use crate::testing::{RecordingYield, ScriptedBackend};
    use std::sync::mpsc;
    use std::time::Duration;

    fn surfaces(names: &[&str]) -> Vec<SlideSurface> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                SlideSurface::new(format!("s{}", i + 1), i, SurfaceHandle::new(name))
                    .with_title(format!("Slide {}", i + 1))
            })
            .collect()
    }

    fn coordinator(backend: Arc<ScriptedBackend>, sink: Arc<MemorySink>) -> ExportCoordinator {
        let config = CoordinatorConfig::default().with_pauses(Pauses::none());
        ExportCoordinator::from_config(config, backend, sink, Arc::new(NoYield))
    }

    #[test]
    fn test_encode_percentage() {
        assert_eq!(encode_percentage(0), 50);
        assert_eq!(encode_percentage(1), 51);
        assert_eq!(encode_percentage(90), 95);
        assert_eq!(encode_percentage(100), 100);
    }

    #[test]
    fn test_selection_with_no_match_never_captures() {
        let backend = Arc::new(ScriptedBackend::new(4, 3));
        let sink = Arc::new(MemorySink::new());
        let coord = coordinator(backend.clone(), sink.clone());
        let options = ExportOptions::new(ExportFormat::Png).with_selected_slides(["missing"]);

        let result = coord.export(&surfaces(&["live/a"]), &options, &mut |_| {});
        assert_eq!(result.error_kind(), Some(ExportErrorKind::InvalidOptions));
        assert_eq!(result.error.unwrap().message, "No slides to export");
        assert!(backend.calls().is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_empty_deck_is_invalid() {
        let coord = coordinator(
            Arc::new(ScriptedBackend::new(4, 3)),
            Arc::new(MemorySink::new()),
        );
        let err = coord
            .execute_export(&[], &ExportOptions::default(), &mut |_| {})
            .unwrap_err();
        assert_eq!(err.kind(), ExportErrorKind::InvalidOptions);
        assert!(!coord.is_exporting());
    }

    #[test]
    fn test_selection_preserves_deck_order() {
        let backend = Arc::new(ScriptedBackend::new(4, 3));
        let sink = Arc::new(MemorySink::new());
        let coord = coordinator(backend, sink.clone());
        let options = ExportOptions::new(ExportFormat::Png).with_selected_slides(["s3", "s1"]);

        let stats = coord
            .execute_export(&surfaces(&["live/a", "live/b", "live/c"]), &options, &mut |_| {})
            .unwrap();
        assert_eq!(stats.total_slides, 2);
        assert_eq!(sink.names(), vec!["slide-slide-1.png", "slide-slide-3.png"]);
    }

    #[test]
    fn test_all_captures_failing() {
        let coord = coordinator(
            Arc::new(ScriptedBackend::new(4, 3)),
            Arc::new(MemorySink::new()),
        );
        let result = coord.export(
            &surfaces(&["gone/a", "gone/b"]),
            &ExportOptions::new(ExportFormat::Pdf),
            &mut |_| {},
        );
        let error = result.error.clone().unwrap();
        assert_eq!(error.kind, ExportErrorKind::CaptureFailed);
        assert_eq!(error.message, "Failed to capture any slides");
        assert_eq!(error.slide_id.as_deref(), Some("s1"));
        let stats = result.stats.unwrap();
        assert_eq!((stats.total_slides, stats.failed_slides), (2, 2));
    }

    #[test]
    fn test_partial_capture_still_succeeds() {
        let sink = Arc::new(MemorySink::new());
        let coord = coordinator(Arc::new(ScriptedBackend::new(4, 3)), sink.clone());
        let result = coord.export(
            &surfaces(&["live/a", "gone/b", "live/c"]),
            &ExportOptions::new(ExportFormat::Ppt).with_file_name("deck"),
            &mut |_| {},
        );
        assert!(result.success);
        let stats = result.stats.unwrap();
        assert_eq!(
            (stats.total_slides, stats.captured_slides, stats.failed_slides),
            (3, 2, 1)
        );
        assert!(stats.file_size.is_some());
        assert_eq!(sink.names(), vec!["deck.pptx"]);
    }

    #[test]
    fn test_progress_is_monotonic_and_ends_at_100() {
        let coord = coordinator(
            Arc::new(ScriptedBackend::new(4, 3)),
            Arc::new(MemorySink::new()),
        );
        let mut seen = Vec::new();
        coord.export(
            &surfaces(&["live/a", "live/b", "gone/c", "live/d"]),
            &ExportOptions::new(ExportFormat::Pdf),
            &mut |p| seen.push((p.percentage, p.status)),
        );

        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0), "{:?}", seen);
        assert!(seen.contains(&(50, ExportStatus::Capturing)));
        assert_eq!(seen.last(), Some(&(100, ExportStatus::Completed)));
        assert_eq!(
            seen.iter().filter(|(_, s)| *s == ExportStatus::Completed).count(),
            1
        );
    }

    #[test]
    fn test_encoder_failure_is_reraised() {
        struct FullDisk;
        impl DownloadSink for FullDisk {
            fn save(&self, _: &str, _: &str, _: &[u8]) -> Result<()> {
                Err(Error::Download("no space left".to_string()))
            }
        }

        let coord = ExportCoordinator::from_config(
            CoordinatorConfig::default().with_pauses(Pauses::none()),
            Arc::new(ScriptedBackend::new(4, 3)),
            Arc::new(FullDisk),
            Arc::new(NoYield),
        );
        let err = coord
            .execute_export(&surfaces(&["live/a"]), &ExportOptions::default(), &mut |_| {})
            .unwrap_err();
        assert_eq!(err.kind(), ExportErrorKind::DownloadFailed);
        assert!(err.to_string().contains("no space left"), "{}", err);
    }

    /// Yield point that parks the first capture pause until released.
    struct Gate {
        entered: parking_lot::Mutex<Option<mpsc::Sender<()>>>,
        release: parking_lot::Mutex<mpsc::Receiver<()>>,
    }

    impl YieldPoint for Gate {
        fn pause(&self, kind: YieldKind, _duration: Duration) {
            if kind != YieldKind::BetweenCaptures {
                return;
            }
            if let Some(tx) = self.entered.lock().take() {
                let _ = tx.send(());
                let _ = self.release.lock().recv();
            }
        }
    }

    fn gated() -> (Arc<Gate>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Arc::new(Gate {
            entered: parking_lot::Mutex::new(Some(entered_tx)),
            release: parking_lot::Mutex::new(release_rx),
        });
        (gate, entered_rx, release_tx)
    }

    #[test]
    fn test_concurrent_export_rejected_and_cancel_between_phases() {
        let (gate, entered, release) = gated();
        let sink = Arc::new(MemorySink::new());
        let coord = Arc::new(ExportCoordinator::from_config(
            CoordinatorConfig::default().with_pauses(Pauses::none()),
            Arc::new(ScriptedBackend::new(4, 3)),
            sink.clone(),
            gate,
        ));
        let slides = surfaces(&["live/a", "live/b"]);

        let worker = {
            let coord = coord.clone();
            let slides = slides.clone();
            std::thread::spawn(move || {
                coord.export(&slides, &ExportOptions::new(ExportFormat::Png), &mut |_| {})
            })
        };

        entered.recv().unwrap();
        assert!(coord.is_exporting());

        let second = coord.export(&slides, &ExportOptions::default(), &mut |_| {});
        assert_eq!(second.error_kind(), Some(ExportErrorKind::InvalidOptions));
        assert_eq!(second.error.unwrap().message, "An export is already in progress");

        coord.cancel();
        release.send(()).unwrap();
        let first = worker.join().unwrap();

        assert_eq!(first.error_kind(), Some(ExportErrorKind::Cancelled));
        let stats = first.stats.unwrap();
        assert_eq!((stats.total_slides, stats.captured_slides), (2, 2));
        assert!(sink.is_empty());
        assert!(!coord.is_exporting());
    }

    #[test]
    fn test_export_state_cancel_is_scoped_to_one_run() {
        let state = ExportState::new();
        assert!(!state.request_cancel());
        assert!(!state.is_cancelled());

        let guard = state.begin().unwrap();
        assert!(state.begin().is_none());
        assert!(state.request_cancel());
        assert!(state.is_cancelled());
        assert!(state.is_running());
        drop(guard);

        assert!(!state.is_running());
        assert!(!state.request_cancel());
        let _next = state.begin().unwrap();
        assert!(!state.is_cancelled());
    }

    #[test]
    fn test_export_after_cancelled_export_runs() {
        let (gate, entered, release) = gated();
        let sink = Arc::new(MemorySink::new());
        let coord = Arc::new(ExportCoordinator::from_config(
            CoordinatorConfig::default().with_pauses(Pauses::none()),
            Arc::new(ScriptedBackend::new(4, 3)),
            sink.clone(),
            gate,
        ));
        let slides = surfaces(&["live/a", "live/b"]);

        let worker = {
            let coord = coord.clone();
            let slides = slides.clone();
            std::thread::spawn(move || {
                coord.export(&slides, &ExportOptions::new(ExportFormat::Png), &mut |_| {})
            })
        };
        entered.recv().unwrap();
        coord.cancel();
        release.send(()).unwrap();
        let first = worker.join().unwrap();
        assert_eq!(first.error_kind(), Some(ExportErrorKind::Cancelled));

        let second = coord.export(&slides, &ExportOptions::new(ExportFormat::Png), &mut |_| {});
        assert!(second.success, "{:?}", second.error);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_configured_pauses_reach_every_yield_point() {
        let yielder = Arc::new(RecordingYield::default());
        let pauses = Pauses {
            settle: Duration::from_millis(7),
            between_captures: Duration::from_millis(3),
            between_downloads: Duration::from_millis(5),
        };
        let coord = ExportCoordinator::from_config(
            CoordinatorConfig::default().with_pauses(pauses),
            Arc::new(ScriptedBackend::new(4, 3)),
            Arc::new(MemorySink::new()),
            yielder.clone(),
        );
        coord
            .execute_export(
                &surfaces(&["live/a", "live/b"]),
                &ExportOptions::new(ExportFormat::Png),
                &mut |_| {},
            )
            .unwrap();

        assert_eq!(
            yielder.pauses(),
            vec![
                (YieldKind::Settle, Duration::from_millis(7)),
                (YieldKind::BetweenCaptures, Duration::from_millis(3)),
                (YieldKind::Settle, Duration::from_millis(7)),
                (YieldKind::BetweenDownloads, Duration::from_millis(5)),
            ]
        );
    }

    #[test]
    fn test_cancel_when_idle_is_ignored() {
        let sink = Arc::new(MemorySink::new());
        let coord = coordinator(Arc::new(ScriptedBackend::new(4, 3)), sink.clone());
        coord.cancel();
        let result = coord.export(
            &surfaces(&["live/a"]),
            &ExportOptions::new(ExportFormat::Png),
            &mut |_| {},
        );
        assert!(result.success);
        assert_eq!(sink.len(), 1);
    }
}
