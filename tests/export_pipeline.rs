//! End-to-end export tests: slide images on disk through capture, encoding
//! and a directory sink.

use deckport::{
    surfaces_from_paths, CoordinatorConfig, DirectorySink, ExportCoordinator, ExportErrorKind,
    ExportFormat, ExportOptions, ExportStatus, ImageFileBackend, NoYield, Pauses, Quality,
    SlideSurface,
};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes `names` as 40x30 PNG slides into a fresh directory.
fn slide_images(names: &[&str]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let path = dir.path().join(format!("{}.png", name));
            RgbaImage::from_pixel(40, 30, Rgba([30 * i as u8, 90, 160, 255]))
                .save(&path)
                .unwrap();
            path
        })
        .collect();
    (dir, paths)
}

fn coordinator(out: &Path) -> (ExportCoordinator, Arc<DirectorySink>) {
    let sink = Arc::new(DirectorySink::new(out));
    let coordinator = ExportCoordinator::from_config(
        CoordinatorConfig::default().with_pauses(Pauses::none()),
        Arc::new(ImageFileBackend::new()),
        sink.clone(),
        Arc::new(NoYield),
    );
    (coordinator, sink)
}

fn file_names(sink: &DirectorySink) -> Vec<String> {
    sink.saved_paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test_log::test]
fn test_png_export_uses_titles_in_names() {
    let (_src, paths) = slide_images(&["intro", "summary"]);
    let out = tempfile::tempdir().unwrap();
    let (coordinator, sink) = coordinator(out.path());

    let slides: Vec<SlideSurface> = surfaces_from_paths(&paths, true)
        .into_iter()
        .map(|s| {
            let title = s.title.clone().unwrap_or_default();
            s.with_title(format!("{}{}", &title[..1].to_uppercase(), &title[1..]))
        })
        .collect();
    let options = ExportOptions::new(ExportFormat::Png).with_file_name("deck");

    let stats = coordinator
        .execute_export(&slides, &options, &mut |_| {})
        .unwrap();
    assert_eq!(stats.captured_slides, 2);
    assert_eq!(file_names(&sink), vec!["deck-intro.png", "deck-summary.png"]);
    assert!(out.path().join("deck-intro.png").is_file());
}

#[test_log::test]
fn test_quality_scales_output() {
    let (_src, paths) = slide_images(&["one"]);

    for (quality, expected) in [
        (Quality::Low, (40, 30)),
        (Quality::Medium, (80, 60)),
        (Quality::High, (120, 90)),
    ] {
        let out = tempfile::tempdir().unwrap();
        let (coordinator, sink) = coordinator(out.path());
        let options = ExportOptions::new(ExportFormat::Png).with_quality(quality);

        coordinator
            .execute_export(&surfaces_from_paths(&paths, false), &options, &mut |_| {})
            .unwrap();
        let saved = &sink.saved_paths()[0];
        let image = image::open(saved).unwrap();
        assert_eq!((image.width(), image.height()), expected, "{:?}", quality);
    }
}

#[test_log::test]
fn test_jpeg_export_transcodes() {
    let (_src, paths) = slide_images(&["a", "b", "c"]);
    let out = tempfile::tempdir().unwrap();
    let (coordinator, sink) = coordinator(out.path());

    coordinator
        .execute_export(
            &surfaces_from_paths(&paths, false),
            &ExportOptions::new(ExportFormat::Jpeg).with_quality(Quality::Low),
            &mut |_| {},
        )
        .unwrap();

    assert_eq!(file_names(&sink), vec!["slide-a.jpg", "slide-b.jpg", "slide-c.jpg"]);
    let bytes = std::fs::read(&sink.saved_paths()[0]).unwrap();
    assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
}

#[test_log::test]
fn test_pdf_export_writes_document() {
    let (_src, paths) = slide_images(&["a", "b"]);
    let out = tempfile::tempdir().unwrap();
    let (coordinator, sink) = coordinator(out.path());

    let stats = coordinator
        .execute_export(
            &surfaces_from_paths(&paths, false),
            &ExportOptions::new(ExportFormat::Pdf).with_file_name("handout.PDF"),
            &mut |_| {},
        )
        .unwrap();

    assert_eq!(file_names(&sink), vec!["handout.PDF"]);
    let bytes = std::fs::read(&sink.saved_paths()[0]).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(stats.file_size, Some(bytes.len() as u64));
}

#[test_log::test]
fn test_missing_slide_is_skipped() {
    let (src, mut paths) = slide_images(&["a", "c"]);
    paths.insert(1, src.path().join("b.png"));
    let out = tempfile::tempdir().unwrap();
    let (coordinator, _sink) = coordinator(out.path());

    let mut statuses = Vec::new();
    let result = coordinator.export(
        &surfaces_from_paths(&paths, false),
        &ExportOptions::new(ExportFormat::Ppt).with_file_name("deck"),
        &mut |p| statuses.push(p.status),
    );

    assert!(result.success);
    let stats = result.stats.unwrap();
    assert_eq!(
        (stats.total_slides, stats.captured_slides, stats.failed_slides),
        (3, 2, 1)
    );
    assert!(statuses.contains(&ExportStatus::Capturing));
    assert_eq!(statuses.last(), Some(&ExportStatus::Completed));

    let deck = std::fs::read(out.path().join("deck.pptx")).unwrap();
    assert_eq!(deckport::verify_presentation(&deck).unwrap().slide_count, 2);
}

#[test_log::test]
fn test_options_from_json() {
    let (_src, paths) = slide_images(&["a", "b", "c"]);
    let out = tempfile::tempdir().unwrap();
    let (coordinator, sink) = coordinator(out.path());

    let options = ExportOptions::from_json(
        r#"{"format":"png","quality":"low","fileName":"pick","selectedSlideIds":["c","a"]}"#,
    )
    .unwrap();
    coordinator
        .execute_export(&surfaces_from_paths(&paths, false), &options, &mut |_| {})
        .unwrap();

    assert_eq!(file_names(&sink), vec!["pick-a.png", "pick-c.png"]);
}

#[test_log::test]
fn test_unknown_selection_is_invalid() {
    let (_src, paths) = slide_images(&["a"]);
    let out = tempfile::tempdir().unwrap();
    let (coordinator, sink) = coordinator(out.path());

    let err = coordinator
        .execute_export(
            &surfaces_from_paths(&paths, false),
            &ExportOptions::new(ExportFormat::Pdf).with_selected_slides(["zzz"]),
            &mut |_| {},
        )
        .unwrap_err();
    assert_eq!(err.kind(), ExportErrorKind::InvalidOptions);
    assert_eq!(err.to_string(), "No slides to export");
    assert!(sink.saved_paths().is_empty());
}

#[test_log::test]
fn test_export_files_convenience() {
    let (_src, paths) = slide_images(&["a", "b"]);
    let out = tempfile::tempdir().unwrap();

    let stats = deckport::export_files(
        &paths,
        &ExportOptions::new(ExportFormat::Keynote)
            .with_quality(Quality::Low)
            .with_file_name("talk"),
        out.path(),
    )
    .unwrap();

    assert_eq!(stats.captured_slides, 2);
    assert!(out.path().join("talk.pptx").is_file());
}

#[test_log::test]
fn test_same_titles_keep_every_slide() {
    let (_src, paths) = slide_images(&["a", "b", "c"]);
    let out = tempfile::tempdir().unwrap();
    let (coordinator, sink) = coordinator(out.path());

    let slides: Vec<SlideSurface> = surfaces_from_paths(&paths, false)
        .into_iter()
        .zip(["Agenda", "Agenda", "agenda!"])
        .map(|(s, title)| s.with_title(title))
        .collect();
    let stats = coordinator
        .execute_export(
            &slides,
            &ExportOptions::new(ExportFormat::Png).with_file_name("deck"),
            &mut |_| {},
        )
        .unwrap();

    assert_eq!(stats.captured_slides, 3);
    assert_eq!(
        file_names(&sink),
        vec!["deck-agenda.png", "deck-agenda (1).png", "deck-agenda (2).png"]
    );
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 3);
}
