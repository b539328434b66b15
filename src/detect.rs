//! Container detection for MZ-class executables.

use std::io::{Read, Seek};

use log::{debug, trace};

use crate::{constants::*, errors::*, types::*, util::*};

/// Format of the header following the legacy MS-DOS header.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Format {
    /// 32-bit or 64-bit portable executable.
    Pe,
    /// 16-bit segmented executable.
    Ne,
    /// Not an executable with a supported new-format header.
    Unknown,
}

/// Detected container: the format and the file offset of its new-format header.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Container {
    pub format:            Format,
    pub new_header_offset: u32,
}
impl Container {
    const fn unknown() -> Self {
        Self {
            format:            Format::Unknown,
            new_header_offset: 0,
        }
    }
}

/// Reads the legacy MS-DOS header.
///
/// # Returns
/// Returns `None` if the file does not start with the `MZ` signature.
/// Nothing beyond the legacy header is read in that case.
pub fn read_dos_header<R: Read + Seek>(reader: &mut R) -> Result<Option<DosHeader>, ReadError> {
    let header = read_at::<DosHeader, R>(reader, 0)?;
    let magic = header.magic;
    debug!("dos_magic: {:#x?}", magic);
    if magic != DOS_MAGIC {
        return Ok(None);
    }
    let new_header_offset = header.new_header_offset;
    debug!("new_header_offset: {:#x?}", new_header_offset);
    Ok(Some(header))
}

/// Detects the container format of an executable.
///
/// Files that are too short, lack the `MZ` signature or carry an unknown new-format header
/// signature are reported as [`Format::Unknown`].
pub fn detect<R: Read + Seek>(reader: &mut R) -> Result<Container, ImageReadError> {
    let header = match read_dos_header(reader) {
        Ok(Some(header)) => header,
        Ok(None) => return Ok(Container::unknown()),
        Err(e) => {
            debug!("no legacy header: {}", e);
            return Ok(Container::unknown());
        }
    };
    let new_header_offset = header.new_header_offset;

    let signature = peek_at(reader, new_header_offset as u64, 4)?;
    trace!("new header signature: {:x?}", signature);
    let format = if signature.len() == 4
        && u32::from_le_bytes([signature[0], signature[1], signature[2], signature[3]])
            == PE_NT_SIGNATURE
    {
        Format::Pe
    } else if signature.len() >= 2 && u16::from_le_bytes([signature[0], signature[1]]) == NE_SIGNATURE
    {
        Format::Ne
    } else {
        Format::Unknown
    };
    debug!("detected format: {:?}", format);

    Ok(Container {
        format,
        new_header_offset,
    })
}
