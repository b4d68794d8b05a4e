//! In-memory presentation package and its ZIP serialization.

use super::parts::{self, rel_type, Rel};
use super::SlideSize;
use crate::error::Result;
use chrono::{DateTime, Utc};
use log::debug;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A single file inside the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    /// Archive path without a leading slash, e.g. `ppt/slides/slide1.xml`
    pub path: String,
    /// Raw bytes of the part
    pub content: Vec<u8>,
}

impl PackagePart {
    /// An XML part.
    pub fn xml(path: impl Into<String>, content: String) -> Self {
        Self {
            path: path.into(),
            content: content.into_bytes(),
        }
    }

    /// A binary part such as an embedded image.
    pub fn binary(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    /// Whether the part holds XML (including `.rels`).
    pub fn is_xml(&self) -> bool {
        self.path.ends_with(".xml") || self.path.ends_with(".rels")
    }

    /// Part content as UTF-8 text, if it is text.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// A complete presentation, ready to be written as an archive.
#[derive(Debug, Clone)]
pub struct PresentationPackage {
    parts: Vec<PackagePart>,
    slide_count: usize,
    size: SlideSize,
}

impl PresentationPackage {
    /// All parts, in archive order.
    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }

    /// Paths of all parts, in archive order.
    pub fn paths(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.path.as_str()).collect()
    }

    /// Look up a part by path.
    pub fn part(&self, path: &str) -> Option<&PackagePart> {
        self.parts.iter().find(|p| p.path == path)
    }

    /// Number of slides in the deck.
    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Slide size in EMU.
    pub fn size(&self) -> SlideSize {
        self.size
    }

    /// Serialize the package to ZIP bytes.
    ///
    /// XML parts are deflated; media is stored since PNG is already compressed.
    pub fn write_archive(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for part in &self.parts {
            let options = if part.is_xml() { deflated } else { stored };
            writer.start_file(part.path.as_str(), options)?;
            writer.write_all(&part.content)?;
        }

        let cursor = writer.finish()?;
        let bytes = cursor.into_inner();
        debug!(
            "Packaged {} parts into {} bytes",
            self.parts.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Builds a [`PresentationPackage`] one slide at a time.
///
/// Slides must already be PNG-encoded; they are stored as
/// `ppt/media/imageN.png`.
#[derive(Debug)]
pub struct PackageBuilder {
    size: SlideSize,
    title: String,
    slides: Vec<PackagePart>,
    media: Vec<PackagePart>,
    slide_rels: Vec<PackagePart>,
}

impl PackageBuilder {
    /// Start an empty deck with the given slide size.
    pub fn new(size: SlideSize) -> Self {
        Self {
            size,
            title: "Presentation".to_string(),
            slides: Vec::new(),
            media: Vec::new(),
            slide_rels: Vec::new(),
        }
    }

    /// Set the document title written to `docProps/core.xml`.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Number of slides added so far.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether no slides have been added.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Append a slide showing `png` across the full canvas.
    pub fn add_slide(&mut self, png: Vec<u8>, title: &str) {
        let n = self.slides.len() + 1;
        debug!("Adding slide part {} ({} bytes of media)", n, png.len());

        self.slides.push(PackagePart::xml(
            format!("ppt/slides/slide{}.xml", n),
            parts::slide(n, title, self.size),
        ));
        self.slide_rels.push(PackagePart::xml(
            format!("ppt/slides/_rels/slide{}.xml.rels", n),
            parts::relationships(&[
                Rel::new("rId1", rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                Rel::new("rId2", rel_type::IMAGE, format!("../media/image{}.png", n)),
            ]),
        ));
        self.media.push(PackagePart::binary(
            format!("ppt/media/image{}.png", n),
            png,
        ));
    }

    /// Assemble every part.
    pub fn finish(self, created: DateTime<Utc>) -> PresentationPackage {
        let count = self.slides.len();
        let slide_rel_ids: Vec<String> = (0..count).map(|i| format!("rId{}", i + 2)).collect();

        let mut presentation_rels = vec![Rel::new(
            "rId1",
            rel_type::SLIDE_MASTER,
            "slideMasters/slideMaster1.xml",
        )];
        for (i, id) in slide_rel_ids.iter().enumerate() {
            presentation_rels.push(Rel::new(
                id.clone(),
                rel_type::SLIDE,
                format!("slides/slide{}.xml", i + 1),
            ));
        }
        let next = count + 2;
        presentation_rels.push(Rel::new(format!("rId{}", next), rel_type::PRES_PROPS, "presProps.xml"));
        presentation_rels.push(Rel::new(format!("rId{}", next + 1), rel_type::VIEW_PROPS, "viewProps.xml"));
        presentation_rels.push(Rel::new(format!("rId{}", next + 2), rel_type::THEME, "theme/theme1.xml"));
        presentation_rels.push(Rel::new(format!("rId{}", next + 3), rel_type::TABLE_STYLES, "tableStyles.xml"));

        let mut all = Vec::with_capacity(18 + count * 3);
        all.push(PackagePart::xml("[Content_Types].xml", parts::content_types(count)));
        all.push(PackagePart::xml(
            "_rels/.rels",
            parts::relationships(&[
                Rel::new("rId1", rel_type::OFFICE_DOCUMENT, "ppt/presentation.xml"),
                Rel::new("rId2", rel_type::CORE_PROPERTIES, "docProps/core.xml"),
                Rel::new("rId3", rel_type::EXTENDED_PROPERTIES, "docProps/app.xml"),
            ]),
        ));
        all.push(PackagePart::xml(
            "docProps/core.xml",
            parts::core_properties(&self.title, created),
        ));
        all.push(PackagePart::xml("docProps/app.xml", parts::app_properties(count)));
        all.push(PackagePart::xml(
            "ppt/presentation.xml",
            parts::presentation(self.size, &slide_rel_ids),
        ));
        all.push(PackagePart::xml(
            "ppt/_rels/presentation.xml.rels",
            parts::relationships(&presentation_rels),
        ));
        all.extend(self.slides);
        all.extend(self.slide_rels);
        all.push(PackagePart::xml(
            "ppt/slideMasters/slideMaster1.xml",
            parts::slide_master(),
        ));
        all.push(PackagePart::xml(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            parts::relationships(&[
                Rel::new("rId1", rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                Rel::new("rId2", rel_type::THEME, "../theme/theme1.xml"),
            ]),
        ));
        all.push(PackagePart::xml(
            "ppt/slideLayouts/slideLayout1.xml",
            parts::slide_layout(),
        ));
        all.push(PackagePart::xml(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            parts::relationships(&[Rel::new(
                "rId1",
                rel_type::SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )]),
        ));
        all.push(PackagePart::xml("ppt/theme/theme1.xml", parts::theme()));
        all.push(PackagePart::xml("ppt/presProps.xml", parts::presentation_properties()));
        all.push(PackagePart::xml("ppt/viewProps.xml", parts::view_properties()));
        all.push(PackagePart::xml("ppt/tableStyles.xml", parts::table_styles()));
        all.extend(self.media);

        PresentationPackage {
            parts: all,
            slide_count: count,
            size: self.size,
        }
    }
}
