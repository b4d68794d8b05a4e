//! Render backends.

use crate::error::{Error, Result};
use crate::model::SurfaceHandle;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::debug;

/// Draws slide surfaces into bitmaps.
///
/// Implementations own the shared viewport; the pipeline never calls them
/// concurrently.
pub trait RenderBackend: Send + Sync {
    /// Wait until embedded fonts are available.
    fn fonts_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Whether the handle resolves to a live, attached surface.
    fn is_live(&self, handle: &SurfaceHandle) -> bool;

    /// Bring the surface into the visible viewport.
    fn scroll_into_view(&self, handle: &SurfaceHandle) -> Result<()>;

    /// Rasterize the surface at `scale` times its natural size.
    fn render(&self, handle: &SurfaceHandle, scale: u32) -> Result<RgbaImage>;
}

/// Backend that treats each handle as a pre-rendered slide image on disk.
#[derive(Debug, Clone, Copy)]
pub struct ImageFileBackend {
    filter: FilterType,
}

impl ImageFileBackend {
    /// Create a backend that upscales with Lanczos3.
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    /// Use a different resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl Default for ImageFileBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for ImageFileBackend {
    fn is_live(&self, handle: &SurfaceHandle) -> bool {
        handle.location().is_some_and(|path| path.is_file())
    }

    fn scroll_into_view(&self, handle: &SurfaceHandle) -> Result<()> {
        debug!("Surface {:?} is always in view", handle.location());
        Ok(())
    }

    fn render(&self, handle: &SurfaceHandle, scale: u32) -> Result<RgbaImage> {
        let path = handle
            .location()
            .ok_or_else(|| Error::Generation("Surface handle is detached".to_string()))?;
        let natural = image::open(path)?.to_rgba8();
        if scale <= 1 {
            return Ok(natural);
        }
        let (width, height) = natural.dimensions();
        Ok(imageops::resize(
            &natural,
            width * scale,
            height * scale,
            self.filter,
        ))
    }
}
