//! Maps slide ids to the surfaces that render them.

use crate::model::{SlideRecord, SlideSurface, SurfaceHandle};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Registry of live slide surfaces, keyed by slide id.
///
/// The rendering side registers a surface when a slide is mounted and
/// unregisters it when the slide goes away. Export looks surfaces up by id;
/// a slide with no registered surface gets a detached handle and fails
/// capture on its own without affecting the rest of the deck.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: RwLock<HashMap<String, SurfaceHandle>>,
}

impl SurfaceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the surface for a slide.
    pub fn register(&self, id: impl Into<String>, handle: SurfaceHandle) {
        let id = id.into();
        debug!("Registered surface for slide {}", id);
        self.surfaces.write().insert(id, handle);
    }

    /// Remove a slide's surface, returning the old handle.
    pub fn unregister(&self, id: &str) -> Option<SurfaceHandle> {
        self.surfaces.write().remove(id)
    }

    /// Handle registered for `id`, if any.
    pub fn get(&self, id: &str) -> Option<SurfaceHandle> {
        self.surfaces.read().get(id).cloned()
    }

    /// Number of registered surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.read().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.surfaces.read().is_empty()
    }

    /// Build export surfaces for slide records, keeping their order.
    pub fn surfaces_for(&self, records: &[SlideRecord]) -> Vec<SlideSurface> {
        let surfaces = self.surfaces.read();
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let handle = surfaces
                    .get(&record.id)
                    .cloned()
                    .unwrap_or_else(SurfaceHandle::detached);
                let surface = SlideSurface::new(record.id.clone(), index, handle);
                match record.name.as_deref().map(str::trim) {
                    Some(name) if !name.is_empty() => surface.with_title(name),
                    _ => surface,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: Option<&str>) -> SlideRecord {
        SlideRecord {
            id: id.to_string(),
            kind: "title".to_string(),
            name: name.map(String::from),
            props: serde_json::json!({}),
        }
    }

    #[test]
    fn test_surfaces_follow_record_order() {
        let registry = SurfaceRegistry::new();
        registry.register("b", SurfaceHandle::new("live/b"));
        registry.register("a", SurfaceHandle::new("live/a"));

        let surfaces = registry.surfaces_for(&[record("a", Some("Intro")), record("b", None)]);
        assert_eq!(surfaces.len(), 2);
        assert_eq!((surfaces[0].id.as_str(), surfaces[0].index), ("a", 0));
        assert_eq!(surfaces[0].title.as_deref(), Some("Intro"));
        assert_eq!(surfaces[1].title, None);
        assert_eq!(surfaces[1].handle, SurfaceHandle::new("live/b"));
    }

    #[test]
    fn test_unregistered_slide_is_detached() {
        let registry = SurfaceRegistry::new();
        registry.register("a", SurfaceHandle::new("live/a"));
        assert!(registry.unregister("a").is_some());
        assert!(registry.is_empty());

        let surfaces = registry.surfaces_for(&[record("a", Some("  "))]);
        assert!(!surfaces[0].handle.is_attached());
        assert_eq!(surfaces[0].title, None);
    }

    #[test]
    fn test_register_replaces() {
        let registry = SurfaceRegistry::new();
        registry.register("a", SurfaceHandle::new("live/one"));
        registry.register("a", SurfaceHandle::new("live/two"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a"), Some(SurfaceHandle::new("live/two")));
    }
}
