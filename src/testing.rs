//! Test doubles shared by the unit tests.

use crate::capture::RenderBackend;
use crate::error::{Error, Result};
use crate::model::{CapturedSlide, SurfaceHandle};
use crate::pause::{YieldKind, YieldPoint};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::io::Cursor;
use std::time::Duration;

/// Backend whose live surfaces are handles under `live/`.
pub(crate) struct ScriptedBackend {
    width: u32,
    height: u32,
    failing: Option<String>,
    calls: Mutex<Vec<String>>,
    scales: Mutex<Vec<u32>>,
}

impl ScriptedBackend {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            failing: None,
            calls: Mutex::new(Vec::new()),
            scales: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_render(mut self, name: &str) -> Self {
        self.failing = Some(name.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn scales(&self) -> Vec<u32> {
        self.scales.lock().clone()
    }

    fn name(handle: &SurfaceHandle) -> String {
        handle
            .location()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl RenderBackend for ScriptedBackend {
    fn fonts_ready(&self) -> Result<()> {
        self.calls.lock().push("fonts".to_string());
        Ok(())
    }

    fn is_live(&self, handle: &SurfaceHandle) -> bool {
        handle.location().is_some_and(|p| p.starts_with("live"))
    }

    fn scroll_into_view(&self, handle: &SurfaceHandle) -> Result<()> {
        self.calls
            .lock()
            .push(format!("scroll:{}", Self::name(handle)));
        Ok(())
    }

    fn render(&self, handle: &SurfaceHandle, scale: u32) -> Result<RgbaImage> {
        let name = Self::name(handle);
        self.calls.lock().push(format!("render:{}@{}", name, scale));
        if self.failing.as_deref() == Some(name.as_str()) {
            return Err(Error::Generation("renderer crashed".to_string()));
        }
        self.scales.lock().push(scale);
        Ok(RgbaImage::from_pixel(
            self.width * scale,
            self.height * scale,
            Rgba([200, 40, 40, 128]),
        ))
    }
}

/// Yield point that records every pause.
#[derive(Default)]
pub(crate) struct RecordingYield {
    pauses: Mutex<Vec<(YieldKind, Duration)>>,
}

impl RecordingYield {
    pub(crate) fn pauses(&self) -> Vec<(YieldKind, Duration)> {
        self.pauses.lock().clone()
    }

    pub(crate) fn count(&self, kind: YieldKind) -> usize {
        self.pauses.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl YieldPoint for RecordingYield {
    fn pause(&self, kind: YieldKind, duration: Duration) {
        self.pauses.lock().push((kind, duration));
    }
}

/// Encode a solid bitmap as PNG bytes.
pub(crate) fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba(pixel))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// A captured slide holding a small PNG.
pub(crate) fn captured(id: &str, title: &str) -> CapturedSlide {
    CapturedSlide::from_bytes(id, title, &png_bytes(8, 6, [0, 120, 255, 255]), 8, 6)
}
