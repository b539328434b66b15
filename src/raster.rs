//! Decoded icon raster.

use debug_ignore::DebugIgnore;

#[cfg(feature = "images")]
use crate::errors::DecodeError;

/// Top-down raster with 8-bit RGBA channels.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Raster {
    pub(crate) width:          u32,
    pub(crate) height:         u32,
    pub(crate) pixels:         DebugIgnore<Vec<u8>>,
    pub(crate) dots_per_meter: (i32, i32),
}
impl Raster {
    /// Create a fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4].into(),
            dots_per_meter: (0, 0),
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> u32 { self.width }

    /// Returns the height in pixels.
    pub fn height(&self) -> u32 { self.height }

    /// Returns the number of bytes in one row.
    pub fn stride(&self) -> usize { self.width as usize * 4 }

    /// Returns the horizontal and vertical resolution in pixels per meter, zero if unknown.
    pub fn dots_per_meter(&self) -> (i32, i32) { self.dots_per_meter }

    /// Returns the raw RGBA pixel data, rows from top to bottom.
    pub fn pixels(&self) -> &[u8] { &self.pixels }

    /// Consumes the raster and returns the raw RGBA pixel data.
    pub fn into_pixels(self) -> Vec<u8> { self.pixels.0 }

    /// Returns the RGBA value of a pixel, or `None` if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * 4;
        let pixel = &self.pixels[offset..offset + 4];
        Some([pixel[0], pixel[1], pixel[2], pixel[3]])
    }

    /// Returns the mutable bytes of one row.
    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let offset = y as usize * stride;
        &mut self.pixels[offset..offset + stride]
    }

    #[cfg(feature = "images")]
    /// Converts the raster into an `image` crate buffer.
    pub fn into_rgba_image(self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.0)
    }
}

/// Reads the dimensions from the header of an embedded PNG image.
#[cfg(feature = "images")]
pub(crate) fn png_dimensions(data: &[u8]) -> Result<(u32, u32), DecodeError> {
    let reader = image::ImageReader::with_format(std::io::Cursor::new(data), image::ImageFormat::Png);
    Ok(reader.into_dimensions()?)
}

/// Decodes an embedded PNG image into a raster.
#[cfg(feature = "images")]
pub(crate) fn decode_png(data: &[u8]) -> Result<Raster, DecodeError> {
    let image = image::load_from_memory_with_format(data, image::ImageFormat::Png)?.to_rgba8();
    Ok(Raster {
        width:          image.width(),
        height:         image.height(),
        pixels:         image.into_raw().into(),
        dots_per_meter: (0, 0),
    })
}
