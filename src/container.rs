//! ZIP container access for OOXML packages, used to read exported decks back
//! and check their internal references.

use crate::detect::is_zip_file;
use crate::encode::pptx::{rel_type, SlideSize};
use crate::error::{Error, Result};
use log::debug;
use quick_xml::events::Event;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// A relationship entry from a .rels file.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Collection of relationships parsed from a .rels file.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Map from relationship ID to relationship data
    pub by_id: HashMap<String, Relationship>,
    /// Map from relationship type to list of relationships
    pub by_type: HashMap<String, Vec<Relationship>>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Get relationships by type.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.by_type
            .get(rel_type)
            .map(|v| v.iter().collect())
            .unwrap_or_default()
    }

    /// Add a relationship.
    pub fn add(&mut self, rel: Relationship) {
        self.by_type
            .entry(rel.rel_type.clone())
            .or_default()
            .push(rel.clone());
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// OOXML container abstraction over a ZIP archive.
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Open an OOXML container from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use deckport::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("deck.pptx")?;
    /// assert!(container.exists("ppt/presentation.xml"));
    /// # Ok::<(), deckport::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create an OOXML container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Read an XML part as a string, skipping a UTF-8 byte order mark.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        String::from_utf8(body.to_vec())
            .map_err(|e| Error::Xml(format!("{} is not UTF-8: {}", path, e)))
    }

    /// Read a binary part from the archive.
    pub fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// List all parts in the archive.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive.file_names().map(String::from).collect()
    }

    /// Read and parse the relationships of a part.
    ///
    /// A missing .rels file yields an empty collection.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let rels_path = if part_path.is_empty() || part_path == "/" {
            "_rels/.rels".to_string()
        } else {
            let path = Path::new(part_path);
            let parent = path.parent().unwrap_or(Path::new(""));
            let filename = path.file_name().unwrap_or_default().to_string_lossy();
            if parent.as_os_str().is_empty() {
                format!("_rels/{}.rels", filename)
            } else {
                format!("{}/_rels/{}.rels", parent.display(), filename)
            }
        };

        self.parse_relationships(&rels_path)
    }

    /// Read package-level relationships (_rels/.rels).
    pub fn read_package_relationships(&self) -> Result<Relationships> {
        self.parse_relationships("_rels/.rels")
    }

    fn parse_relationships(&self, rels_path: &str) -> Result<Relationships> {
        let content = match self.read_xml(rels_path) {
            Ok(c) => c,
            Err(Error::MissingComponent(_)) => return Ok(Relationships::new()),
            Err(e) => return Err(e),
        };

        let mut rels = Relationships::new();
        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) if e.name().as_ref() == b"Relationship" => {
                    let mut id = String::new();
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Type" => rel_type = value,
                            b"Target" => target = value,
                            b"TargetMode" => external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }

                    if !id.is_empty() {
                        rels.add(Relationship {
                            id,
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(format!("{}: {}", rels_path, e))),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Resolve a relationship target against the part that owns it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let base_dir = Path::new(base).parent().unwrap_or(Path::new(""));

        let mut result = base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(c) => {
                    result.push(c);
                }
                _ => {}
            }
        }

        result.to_string_lossy().replace('\\', "/")
    }
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.list_files().len())
            .finish()
    }
}

/// One slide as found in a verified package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideEntry {
    /// `p:sldId` value
    pub id: u32,
    /// Slide part path
    pub part: String,
    /// Embedded image part paths
    pub media: Vec<String>,
}

/// Summary of a presentation package whose references all resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationSummary {
    /// Number of slides in `p:sldIdLst`
    pub slide_count: usize,
    /// `p:sldSz`
    pub size: SlideSize,
    /// Slides in presentation order
    pub slides: Vec<SlideEntry>,
    /// Every part in the archive
    pub parts: Vec<String>,
}

/// Check that a `.pptx` archive is internally consistent.
///
/// Every slide id must resolve through the presentation relationships to an
/// existing slide part, every image that slide embeds must exist, and the
/// slide master must be present. Images linked with `TargetMode="External"`
/// live outside the package and are not checked.
pub fn verify_presentation(data: &[u8]) -> Result<PresentationSummary> {
    if !is_zip_file(data) {
        return Err(Error::Zip("not a ZIP archive".to_string()));
    }
    let container = OoxmlContainer::from_bytes(data.to_vec())?;
    container.verify_presentation()
}

impl OoxmlContainer {
    /// Verify this container as a presentation. See [`verify_presentation`].
    pub fn verify_presentation(&self) -> Result<PresentationSummary> {
        if !self.exists("[Content_Types].xml") {
            return Err(Error::MissingComponent("[Content_Types].xml".to_string()));
        }

        let root = self.read_package_relationships()?;
        let main = root
            .get_by_type(rel_type::OFFICE_DOCUMENT)
            .first()
            .map(|r| Self::resolve_path("", &r.target))
            .ok_or_else(|| Error::MissingComponent("officeDocument relationship".to_string()))?;

        let xml = self.read_xml(&main)?;
        let (size, slide_ids) = parse_presentation(&xml)?;
        let pres_rels = self.read_relationships(&main)?;

        for master in pres_rels.get_by_type(rel_type::SLIDE_MASTER) {
            self.require(&Self::resolve_path(&main, &master.target))?;
        }
        if pres_rels.get_by_type(rel_type::SLIDE_MASTER).is_empty() {
            return Err(Error::MissingComponent("slide master relationship".to_string()));
        }

        let mut slides = Vec::with_capacity(slide_ids.len());
        for (id, rel_id) in slide_ids {
            let rel = pres_rels
                .get(&rel_id)
                .ok_or_else(|| Error::MissingComponent(format!("relationship {} for slide {}", rel_id, id)))?;
            let part = Self::resolve_path(&main, &rel.target);
            self.require(&part)?;

            let mut media = Vec::new();
            let rels = self.read_relationships(&part)?;
            for image in rels.get_by_type(rel_type::IMAGE) {
                if image.external {
                    debug!("Slide {} links external image {}", id, image.target);
                    continue;
                }
                let path = Self::resolve_path(&part, &image.target);
                self.require(&path)?;
                media.push(path);
            }
            debug!("Slide {} -> {} ({} images)", id, part, media.len());
            slides.push(SlideEntry { id, part, media });
        }

        Ok(PresentationSummary {
            slide_count: slides.len(),
            size,
            slides,
            parts: self.list_files(),
        })
    }

    fn require(&self, path: &str) -> Result<()> {
        if self.exists(path) {
            Ok(())
        } else {
            Err(Error::MissingComponent(path.to_string()))
        }
    }
}

/// Pull `p:sldSz` and the `(id, r:id)` pairs of `p:sldIdLst`.
fn parse_presentation(xml: &str) -> Result<(SlideSize, Vec<(u32, String)>)> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut size = None;
    let mut slides = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) => match e.name().local_name().as_ref() {
                b"sldSz" => {
                    let mut cx = 0u64;
                    let mut cy = 0u64;
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value);
                        match attr.key.as_ref() {
                            b"cx" => cx = value.parse().unwrap_or(0),
                            b"cy" => cy = value.parse().unwrap_or(0),
                            _ => {}
                        }
                    }
                    size = Some(SlideSize { cx, cy });
                }
                b"sldId" => {
                    let mut id = 0u32;
                    let mut rel_id = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"id" => id = String::from_utf8_lossy(&attr.value).parse().unwrap_or(0),
                            // r:id under whatever prefix the relationships namespace uses
                            key if key.ends_with(b":id") => {
                                rel_id = String::from_utf8_lossy(&attr.value).into_owned()
                            }
                            _ => {}
                        }
                    }
                    if rel_id.is_empty() {
                        return Err(Error::Xml(format!("slide {} has no relationship id", id)));
                    }
                    slides.push((id, rel_id));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let size = size.ok_or_else(|| Error::MissingComponent("p:sldSz".to_string()))?;
    Ok((size, slides))
}
