//! Format dispatch and the icon extraction entry points.

use std::io::{Read, Seek};

use log::debug;

use crate::{detect::*, dib::*, errors::*, icon::*, ne::*, options::*, pe::*, raster::*, resource::*};

/// Executable image of one of the supported formats.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Executable {
    Pe(PeImage),
    Ne(NeImage),
}

impl Executable {
    /// Detect the format of an executable and parse its resources.
    ///
    /// # Returns
    /// Returns `None` if the file is not an MZ-class executable with a PE or NE header,
    /// or an error if the detected format fails to parse.
    pub fn parse<R: Read + Seek>(
        reader: &mut R, limits: &Limits,
    ) -> Result<Option<Self>, ImageReadError> {
        let container = detect(reader)?;
        let executable = match container.format {
            Format::Pe => Self::Pe(PeImage::parse(reader, container.new_header_offset, limits)?),
            Format::Ne => Self::Ne(NeImage::parse(reader, container.new_header_offset, limits)?),
            Format::Unknown => return Ok(None),
        };
        Ok(Some(executable))
    }

    /// Returns the format of the executable.
    pub fn format(&self) -> Format {
        match self {
            Self::Pe(_) => Format::Pe,
            Self::Ne(_) => Format::Ne,
        }
    }

    /// Returns the image variants of the main icon group.
    pub fn icons<R: Read + Seek>(
        &self, reader: &mut R, limits: &Limits,
    ) -> Result<Vec<IconVariant>, ImageReadError> {
        read_main_icon_group(reader, self, limits)
    }
}

impl ResourceSource for Executable {
    fn resource_directory(&self) -> &ResourceDirectory {
        match self {
            Self::Pe(image) => image.resource_directory(),
            Self::Ne(image) => image.resource_directory(),
        }
    }

    fn data_offset(&self, data: &DataEntry) -> Option<u64> {
        match self {
            Self::Pe(image) => image.data_offset(data),
            Self::Ne(image) => image.data_offset(data),
        }
    }
}

/// Returns the image variants of the main application icon of an executable.
///
/// Returns an empty list if the file is not a supported executable, has no icon, or its
/// resources are damaged.
pub fn icon_variants<R: Read + Seek>(reader: &mut R, limits: &Limits) -> Vec<IconVariant> {
    let icons = Executable::parse(reader, limits)
        .and_then(|executable| match executable {
            Some(executable) => executable.icons(reader, limits),
            None => Ok(Vec::new()),
        });
    match icons {
        Ok(icons) => icons,
        Err(e) => {
            debug!("no icons: {}", e);
            Vec::new()
        }
    }
}

/// Extract the application icon of an executable as a raster, choosing the image variant best
/// suited for the target size.
///
/// # Returns
/// Returns `None` if the file is not a supported executable, has no icon, or the icon is damaged
/// or uses an unsupported encoding.
pub fn best_icon_raster<R: Read + Seek>(reader: &mut R, options: &ExtractOptions) -> Option<Raster> {
    let variants = icon_variants(reader, &options.limits);
    let variant = select_icon(&variants, options.target_width);
    if variant.is_empty() {
        debug!("no icon variant selected");
        return None;
    }
    debug!("selected {:?}", variant);
    match decode_icon(reader, &variant, &options.limits) {
        Ok(raster) => Some(raster),
        Err(e) => {
            debug!("icon not decoded: {}", e);
            None
        }
    }
}

/// Extract the application icon of an executable for the target size with default limits.
pub fn best_icon_raster_for_size<R: Read + Seek>(
    reader: &mut R, target_width: u32, target_height: u32,
) -> Option<Raster> {
    best_icon_raster(reader, &ExtractOptions::with_target_size(target_width, target_height))
}
