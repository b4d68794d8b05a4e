//! Bitmap transcoding shared by the encoders.

use crate::detect::{detect_bitmap_format, BitmapFormat};
use crate::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, ImageEncoder, Rgba, RgbaImage};
use std::io::Cursor;

/// JPEG quality used for transcoded slides (0.95 on a 0..1 scale).
pub const JPEG_QUALITY: u8 = 95;

/// A JPEG with the pixel size it decodes to.
#[derive(Debug)]
pub(crate) struct Jpeg {
    pub(crate) data: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Composite an encoded image over opaque white and encode it as JPEG.
///
/// JPEG has no alpha channel, so transparent regions become white.
pub(crate) fn flatten_to_jpeg(encoded: &[u8], quality: u8) -> Result<Jpeg> {
    let source = image::load_from_memory(encoded)?.to_rgba8();
    let (width, height) = source.dimensions();

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &source, 0, 0);
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality).write_image(
        rgb.as_raw(),
        width,
        height,
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(Jpeg {
        data,
        width,
        height,
    })
}

/// Return PNG bytes, re-encoding if the source is not already PNG.
pub(crate) fn ensure_png(encoded: Vec<u8>) -> Result<Vec<u8>> {
    if detect_bitmap_format(&encoded)? == BitmapFormat::Png {
        return Ok(encoded);
    }
    let image = image::load_from_memory(&encoded)?;
    let mut data = Vec::new();
    image.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)?;
    Ok(data)
}
