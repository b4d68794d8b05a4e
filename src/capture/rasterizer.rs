//! Single-surface rasterizer.

use super::RenderBackend;
use crate::error::{Error, Result};
use crate::model::{CapturedSlide, Quality, SlideSurface};
use crate::pause::{YieldKind, YieldPoint};
use image::RgbaImage;
use log::debug;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// Turns one slide surface into a [`CapturedSlide`].
#[derive(Clone)]
pub struct Rasterizer {
    backend: Arc<dyn RenderBackend>,
    yielder: Arc<dyn YieldPoint>,
    settle: Duration,
}

impl Rasterizer {
    /// Create a rasterizer over a backend.
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        yielder: Arc<dyn YieldPoint>,
        settle: Duration,
    ) -> Self {
        Self {
            backend,
            yielder,
            settle,
        }
    }

    /// Capture a surface at the scale implied by `quality`.
    ///
    /// Fonts are awaited and the surface scrolled into view first, followed
    /// by a settle pause; a surface caught mid-scroll renders incomplete.
    pub fn capture(&self, surface: &SlideSurface, quality: Quality) -> Result<CapturedSlide> {
        if !self.backend.is_live(&surface.handle) {
            return Err(Error::Capture {
                slide_id: surface.id.clone(),
                message: "Slide surface is not attached".to_string(),
            });
        }

        let scale = quality.scale();
        let bitmap = self
            .render_ready(surface, scale)
            .map_err(|e| capture_error(surface, e))?;
        let (width, height) = bitmap.dimensions();
        let png = encode_png(&bitmap).map_err(|e| capture_error(surface, e))?;

        debug!(
            "Captured slide {} at {}x ({}x{}, {} bytes)",
            surface.id,
            scale,
            width,
            height,
            png.len()
        );

        let title = surface.title.as_deref().unwrap_or(&surface.id);
        Ok(CapturedSlide::from_bytes(
            surface.id.as_str(),
            title,
            &png,
            width,
            height,
        ))
    }

    fn render_ready(&self, surface: &SlideSurface, scale: u32) -> Result<RgbaImage> {
        self.backend.fonts_ready()?;
        self.backend.scroll_into_view(&surface.handle)?;
        self.yielder.pause(YieldKind::Settle, self.settle);
        self.backend.render(&surface.handle, scale)
    }
}

fn capture_error(surface: &SlideSurface, err: Error) -> Error {
    match err {
        Error::Capture { .. } => err,
        other => Error::Capture {
            slide_id: surface.id.clone(),
            message: other.to_string(),
        },
    }
}

/// Encode an RGBA bitmap as PNG.
pub(crate) fn encode_png(bitmap: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bitmap.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}
