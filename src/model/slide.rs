//! Slide surfaces and captured slide snapshots.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque reference to a renderable slide region.
///
/// The [`RenderBackend`](crate::capture::RenderBackend) decides what a handle
/// points at; the bundled file backend treats it as the path of a pre-rendered
/// slide image. A detached handle never resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(Option<PathBuf>);

impl SurfaceHandle {
    /// Create a handle pointing at a surface location.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self(Some(location.into()))
    }

    /// A handle whose surface has been removed or was never registered.
    pub fn detached() -> Self {
        Self(None)
    }

    /// Location of the surface, if the handle is attached.
    pub fn location(&self) -> Option<&Path> {
        self.0.as_deref()
    }

    /// Check whether the handle still refers to something.
    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }
}

/// A slide as seen by the export pipeline: identity plus a surface to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSurface {
    /// Stable slide id
    pub id: String,
    /// Position of the slide in the deck (0-based)
    pub index: usize,
    /// Surface to rasterize
    pub handle: SurfaceHandle,
    /// Optional human-readable title
    pub title: Option<String>,
}

impl SlideSurface {
    /// Create a new slide surface without a title.
    pub fn new(id: impl Into<String>, index: usize, handle: SurfaceHandle) -> Self {
        Self {
            id: id.into(),
            index,
            handle,
            title: None,
        }
    }

    /// Set the slide title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A slide record as kept by the authoring side of the editor.
///
/// Only `id` and `name` matter to export; `kind` and `props` are carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// Stable slide id
    pub id: String,
    /// Template type of the slide
    #[serde(rename = "type")]
    pub kind: String,
    /// Display name, used as the export title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Template properties
    #[serde(default)]
    pub props: serde_json::Value,
}

/// An immutable bitmap snapshot of one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedSlide {
    id: String,
    title: String,
    image_data: String,
    width: u32,
    height: u32,
}

impl CapturedSlide {
    /// Create a captured slide from base64 image data.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_data: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_data: image_data.into(),
            width,
            height,
        }
    }

    /// Create a captured slide from raw encoded image bytes.
    pub fn from_bytes(
        id: impl Into<String>,
        title: impl Into<String>,
        bytes: &[u8],
        width: u32,
        height: u32,
    ) -> Self {
        Self::new(id, title, STANDARD.encode(bytes), width, height)
    }

    /// Slide id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Slide title (falls back to the id at capture time).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Base64 encoded bitmap, possibly with a `data:` URL prefix.
    pub fn image_data(&self) -> &str {
        &self.image_data
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Decode the bitmap into raw encoded image bytes (PNG or JPEG).
    pub fn decode_image(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(strip_data_url(&self.image_data))?)
    }
}

/// Strip a `data:<mime>;base64,` prefix if present.
pub(crate) fn strip_data_url(data: &str) -> &str {
    if data.starts_with("data:") {
        if let Some(pos) = data.find(',') {
            return &data[pos + 1..];
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_handle() {
        let handle = SurfaceHandle::detached();
        assert!(!handle.is_attached());
        assert!(handle.location().is_none());

        let handle = SurfaceHandle::new("slides/intro.png");
        assert!(handle.is_attached());
        assert_eq!(handle.location(), Some(Path::new("slides/intro.png")));
    }

    #[test]
    fn test_decode_plain_base64() {
        let slide = CapturedSlide::from_bytes("s1", "Intro", &[1, 2, 3], 10, 10);
        assert_eq!(slide.image_data(), "AQID");
        assert_eq!(slide.decode_image().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_data_url() {
        let slide = CapturedSlide::new("s1", "Intro", "data:image/png;base64,AQID", 10, 10);
        assert_eq!(slide.decode_image().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_invalid_base64() {
        let slide = CapturedSlide::new("s1", "Intro", "not base64!!", 10, 10);
        assert!(slide.decode_image().is_err());
    }

    #[test]
    fn test_slide_record_json() {
        let json = r#"{"id":"a","type":"cover","name":"Intro","props":{"x":1}}"#;
        let record: SlideRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, "cover");
        assert_eq!(record.name.as_deref(), Some("Intro"));
    }
}
