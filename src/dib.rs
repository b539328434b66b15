//! Decoding of icon images into rasters.
//!
//! Icon images are either PNG streams or device-independent bitmaps with an appended AND mask.
//! See <https://learn.microsoft.com/en-us/windows/win32/gdi/bitmap-storage> for the bitmap layout.

use std::io::{Read, Seek};

use log::{debug, trace};

use crate::{constants::*, errors::*, icon::*, options::*, raster::*, types::*, util::*};

const BLACK: [u8; 4] = [0x00, 0x00, 0x00, 0xff];
const WHITE: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
const TRANSPARENT: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

/// Color depth of a bitmap.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum PixelFormat {
    Indexed1,
    Indexed4,
    Indexed8,
    Bgr555,
    Bgr888,
    Bgra8888,
}
impl PixelFormat {
    fn from_bit_count(bit_count: u16) -> Option<Self> {
        Some(match bit_count {
            1 => Self::Indexed1,
            4 => Self::Indexed4,
            8 => Self::Indexed8,
            16 => Self::Bgr555,
            24 => Self::Bgr888,
            32 => Self::Bgra8888,
            _ => return None,
        })
    }

    fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Indexed1 => 1,
            Self::Indexed4 => 4,
            Self::Indexed8 => 8,
            Self::Bgr555 => 16,
            Self::Bgr888 => 24,
            Self::Bgra8888 => 32,
        }
    }

    /// Converts one stored row into RGBA pixels.
    fn scan_line(&self, input: &[u8], output: &mut [u8], palette: &Palette) {
        match self {
            Self::Indexed1 | Self::Indexed4 | Self::Indexed8 => {
                let bits = self.bits_per_pixel() as usize;
                let mask = ((1u16 << bits) - 1) as u8;
                for (x, pixel) in output.chunks_exact_mut(4).enumerate() {
                    let bit = x * bits;
                    // most significant bits hold the leftmost pixel
                    let shift = 8 - bits - (bit % 8);
                    let index = (input[bit / 8] >> shift) & mask;
                    pixel.copy_from_slice(&palette.colors[index as usize]);
                }
            }
            Self::Bgr555 => {
                for (pixel, input) in output.chunks_exact_mut(4).zip(input.chunks_exact(2)) {
                    let color = u16::from_le_bytes([input[0], input[1]]);
                    pixel.copy_from_slice(&[
                        (((color >> 10) & 0x1f) << 3) as u8,
                        (((color >> 5) & 0x1f) << 3) as u8,
                        ((color & 0x1f) << 3) as u8,
                        0xff,
                    ]);
                }
            }
            Self::Bgr888 => {
                for (pixel, input) in output.chunks_exact_mut(4).zip(input.chunks_exact(3)) {
                    pixel.copy_from_slice(&[input[2], input[1], input[0], 0xff]);
                }
            }
            Self::Bgra8888 => {
                for (pixel, input) in output.chunks_exact_mut(4).zip(input.chunks_exact(4)) {
                    pixel.copy_from_slice(&[input[2], input[1], input[0], input[3]]);
                }
            }
        }
    }
}

/// Color table of an indexed bitmap.
/// Always holds 256 entries so that any stored index resolves to a color.
#[derive(Debug, Clone)]
pub(crate) struct Palette {
    pub(crate) colors: [[u8; 4]; 256],
    pub(crate) count:  usize,
}
impl Palette {
    /// Returns the number of palette entries stored after the header.
    /// Monochrome bitmaps without a declared size store none and use the black and white defaults.
    pub(crate) fn entry_count(header: &BitmapInfoHeader) -> usize {
        let clr_used = header.clr_used;
        let bit_count = header.bit_count;
        match bit_count {
            _ if (1..=256).contains(&clr_used) => clr_used as usize,
            4 => 16,
            8 => 256,
            _ => 0,
        }
    }

    pub(crate) fn read<R: Read>(
        reader: &mut R, header: &BitmapInfoHeader,
    ) -> Result<Self, ReadError> {
        let mut colors = [BLACK; 256];
        colors[1] = WHITE;
        let count = Self::entry_count(header);
        for color in colors.iter_mut().take(count) {
            let entry = read::<RgbQuad, R>(reader)?;
            *color = [entry.red, entry.green, entry.blue, 0xff];
        }
        Ok(Self { colors, count })
    }
}

/// Decode the selected icon variant into a raster.
///
/// # Returns
/// Returns an error if no variant was selected, the bitmap is unsupported or truncated.
/// No partially decoded raster is ever returned.
pub fn decode_icon<R: Read + Seek>(
    reader: &mut R, variant: &IconVariant, limits: &Limits,
) -> Result<Raster, DecodeError> {
    if variant.is_empty() {
        return Err(DecodeError::NoIcon);
    }
    if variant.is_png {
        return decode_png_icon(reader, variant, limits);
    }
    seek(reader, variant.data_offset)?;
    decode_dib(reader, limits)
}

#[cfg(feature = "images")]
fn decode_png_icon<R: Read + Seek>(
    reader: &mut R, variant: &IconVariant, limits: &Limits,
) -> Result<Raster, DecodeError> {
    if variant.data_length > limits.max_resource_size {
        return Err(DecodeError::LimitExceeded(format!(
            "png of {} bytes",
            variant.data_length
        )));
    }
    let data = read_bytes_at(reader, variant.data_offset, variant.data_length as usize)?;
    let raster = decode_png(&data)?;
    debug!("decoded png icon: {}x{}", raster.width(), raster.height());
    Ok(raster)
}

#[cfg(not(feature = "images"))]
fn decode_png_icon<R: Read + Seek>(
    _reader: &mut R, _variant: &IconVariant, _limits: &Limits,
) -> Result<Raster, DecodeError> {
    Err(DecodeError::Unsupported("png icons require the images feature".into()))
}

/// Decode a bitmap icon image starting at the current position of the reader.
///
/// The header height is twice the image height, the color data is followed by a one bit per
/// pixel AND mask. Set mask bits make the pixel fully transparent.
pub fn decode_dib<R: Read>(reader: &mut R, limits: &Limits) -> Result<Raster, DecodeError> {
    let header = read::<BitmapInfoHeader, R>(reader)?;
    trace!("{:#x?}", header);

    let size = header.size;
    if size != BITMAP_INFO_HEADER_SIZE {
        return Err(DecodeError::Unsupported(format!("header size {}", size)));
    }
    let compression = header.compression;
    match compression {
        BI_RGB => {}
        BI_RLE8 | BI_RLE4 => {
            return Err(DecodeError::Unsupported("run-length encoded bitmap".into()));
        }
        BI_BITFIELDS => return Err(DecodeError::Unsupported("bitfield bitmap".into())),
        compression => {
            return Err(DecodeError::Unsupported(format!("compression {}", compression)));
        }
    }
    let bit_count = header.bit_count;
    let format = PixelFormat::from_bit_count(bit_count)
        .ok_or_else(|| DecodeError::Unsupported(format!("{} bits per pixel", bit_count)))?;

    let stored_width = header.width;
    let stored_height = header.height;
    let width = stored_width.unsigned_abs();
    let height = stored_height.unsigned_abs() / 2;
    if stored_width <= 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions(stored_width as i64, stored_height as i64 / 2));
    }
    if width > limits.max_icon_dimension || height > limits.max_icon_dimension {
        return Err(DecodeError::LimitExceeded(format!("icon of {}x{}", width, height)));
    }
    // positive heights store the bottom row first
    let bottom_up = stored_height > 0;

    let palette = Palette::read(reader, &header)?;
    trace!("palette entries: {}", palette.count);

    let mut raster = Raster::new(width, height);
    raster.dots_per_meter = (header.x_pels_per_meter, header.y_pels_per_meter);

    let row_for = |stored_row: u32| if bottom_up { height - 1 - stored_row } else { stored_row };

    let mut row = vec![0u8; row_stride(width, format.bits_per_pixel())];
    for stored_row in 0..height {
        read_row(reader, &mut row)?;
        format.scan_line(&row, raster.row_mut(row_for(stored_row)), &palette);
    }

    // the mask is stored in the same row order as the color data
    let mut row = vec![0u8; row_stride(width, 1)];
    for stored_row in 0..height {
        read_row(reader, &mut row)?;
        let output = raster.row_mut(row_for(stored_row));
        for (x, pixel) in output.chunks_exact_mut(4).enumerate() {
            if (row[x / 8] >> (7 - x % 8)) & 1 != 0 {
                pixel.copy_from_slice(&TRANSPARENT);
            }
        }
    }

    debug!("decoded {:?} icon: {}x{}", format, width, height);
    Ok(raster)
}
