//! Icon group parsing and icon variant selection.
//!
//! See <https://devblogs.microsoft.com/oldnewthing/20120720-00/?p=7083> for the layout of icon
//! group resources.

use std::io::{Read, Seek};

use log::{debug, trace, warn};

use crate::{constants::*, errors::*, options::*, resource::*, types::*, util::*};

/// A single image of an icon group.
///
/// A zero `data_offset` marks the empty variant that is never decoded.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct IconVariant {
    pub width:          i32,
    pub height:         i32,
    pub bits_per_pixel: u16,
    pub is_png:         bool,
    pub data_offset:    u64,
    pub data_length:    u32,
}
impl IconVariant {
    /// Returns whether this is the empty variant.
    pub fn is_empty(&self) -> bool { self.data_offset == 0 }
}

/// Read the image variants of the main icon group.
///
/// The first icon group resource is taken as the main application icon.
/// Entries whose icon resource can not be resolved or read are skipped.
///
/// # Returns
/// Returns an empty list if there is no icon group, or an error if the icon group header is
/// truncated or declares too many entries.
pub fn read_main_icon_group<R: Read + Seek, S: ResourceSource>(
    reader: &mut R, source: &S, limits: &Limits,
) -> Result<Vec<IconVariant>, ImageReadError> {
    let directory = source.resource_directory();
    let Some(group) = directory.first(RT_GROUP_ICON) else {
        debug!("no icon group resource");
        return Ok(Vec::new());
    };
    debug!("main icon group: {:?}", group);
    let group_offset = source.data_offset(&group.data).ok_or_else(|| {
        ImageReadError::MissingSection(format!(
            "no section contains icon group {:#x}",
            group.data.address
        ))
    })?;

    let entries = read_icon_directory(reader, group_offset, limits)?;

    let mut variants = Vec::with_capacity(entries.len());
    for entry in entries {
        match read_icon_variant(reader, source, &entry, limits) {
            Ok(Some(variant)) => {
                trace!("- {:?}", variant);
                variants.push(variant);
            }
            Ok(None) => {}
            Err(e) => warn!("- skipping icon {}: {}", { entry.id }, e),
        }
    }
    debug!("{} icon variants", variants.len());
    Ok(variants)
}

/// Reads the icon group header and its entries.
fn read_icon_directory<R: Read + Seek>(
    reader: &mut R, offset: u64, limits: &Limits,
) -> Result<Vec<IconDirectoryEntry>, ImageReadError> {
    let header = read_at::<IconDirectory, R>(reader, offset)?;
    trace!("{:#x?}: {:#x?}", offset, header);
    let count = header.count;
    if count > limits.max_icon_entries {
        return Err(ImageReadError::LimitExceeded(format!("icon group with {} entries", count)));
    }
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let entry = read::<IconDirectoryEntry, R>(reader)?;
        trace!("- {:#x?}", entry);
        entries.push(entry);
    }
    Ok(entries)
}

/// Resolves an icon group entry to the icon resource and reads its dimensions.
fn read_icon_variant<R: Read + Seek, S: ResourceSource>(
    reader: &mut R, source: &S, entry: &IconDirectoryEntry, limits: &Limits,
) -> Result<Option<IconVariant>, ImageReadError> {
    let id = entry.id;
    let Some(resource) = source.resource_directory().find(RT_ICON, id as u32) else {
        debug!("- icon {} not found", id);
        return Ok(None);
    };
    let Some(data_offset) = source.data_offset(&resource.data) else {
        warn!("- icon {} address {:#x} outside all sections", id, resource.data.address);
        return Ok(None);
    };
    let data_length = resource.data.size;

    let signature = peek_at(reader, data_offset, PNG_SIGNATURE.len())?;
    if signature == PNG_SIGNATURE {
        return read_png_variant(reader, data_offset, data_length, limits);
    }

    let header = read_at::<BitmapInfoHeader, R>(reader, data_offset)?;
    Ok(Some(IconVariant {
        width: header.width,
        height: header.height / 2,
        bits_per_pixel: header.bit_count,
        is_png: false,
        data_offset,
        data_length,
    }))
}

#[cfg(feature = "images")]
fn read_png_variant<R: Read + Seek>(
    reader: &mut R, data_offset: u64, data_length: u32, limits: &Limits,
) -> Result<Option<IconVariant>, ImageReadError> {
    if data_length > limits.max_resource_size {
        return Err(ImageReadError::LimitExceeded(format!("png of {} bytes", data_length)));
    }
    let data = read_bytes_at(reader, data_offset, data_length as usize)?;
    let (width, height) = match crate::raster::png_dimensions(&data) {
        Ok(dimensions) => dimensions,
        Err(e) => {
            warn!("- invalid png icon at {:#x}: {}", data_offset, e);
            return Ok(None);
        }
    };
    Ok(Some(IconVariant {
        width: width.try_into().unwrap_or(i32::MAX),
        height: height.try_into().unwrap_or(i32::MAX),
        bits_per_pixel: 32,
        is_png: true,
        data_offset,
        data_length,
    }))
}

#[cfg(not(feature = "images"))]
fn read_png_variant<R: Read + Seek>(
    _reader: &mut R, data_offset: u64, _data_length: u32, _limits: &Limits,
) -> Result<Option<IconVariant>, ImageReadError> {
    debug!("- skipping png icon at {:#x}, images feature disabled", data_offset);
    Ok(None)
}

/// Select the variant best suited for display at the target width.
///
/// Higher bit depths are always preferred. Among variants of the highest bit depth, the
/// smallest variant at least as wide as the target is chosen, or the widest one if all are
/// narrower. Ties keep the first variant in directory order.
///
/// # Returns
/// Returns the empty variant if the list is empty.
pub fn select_icon(variants: &[IconVariant], target_width: u32) -> IconVariant {
    let target_width = target_width as i64;
    variants.iter().fold(IconVariant::default(), |best, &candidate| {
        let (best_width, candidate_width) = (best.width as i64, candidate.width as i64);
        if candidate.bits_per_pixel > best.bits_per_pixel {
            return candidate;
        }
        if candidate.bits_per_pixel < best.bits_per_pixel {
            return best;
        }
        if best_width < target_width && candidate_width > best_width {
            return candidate;
        }
        if best_width > target_width
            && candidate_width >= target_width
            && candidate_width < best_width
        {
            return candidate;
        }
        best
    })
}
