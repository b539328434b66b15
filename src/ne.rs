//! Segmented (16-bit) executable representation.
//!
//! See <http://www.fileformat.info/format/exe/corion-ne.htm> for the layout of the header and the
//! resource table.

use std::io::{Read, Seek};

use log::{debug, trace, warn};

use crate::{constants::*, errors::*, options::*, resource::*, types::*, util::*};

/// Parsed header and resource table of a segmented executable.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NeImage {
    pub(crate) header:                NeHeader,
    pub(crate) alignment_shift_count: u16,
    pub(crate) resource_directory:    ResourceDirectory,
}

impl NeImage {
    /// Parse a segmented executable whose `NE` signature is at the given file offset.
    ///
    /// # Returns
    /// Returns the `NeImage`, or an error if the signature is invalid, the resource table is
    /// truncated or a limit is exceeded.
    pub fn parse<R: Read + Seek>(
        reader: &mut R, new_header_offset: u32, limits: &Limits,
    ) -> Result<Self, ImageReadError> {
        let header_offset = new_header_offset as u64;
        let header = read_at::<NeHeader, R>(reader, header_offset)?;
        let magic = header.magic;
        debug!("ne_signature: {:#x?}", magic);
        if magic != NE_SIGNATURE {
            return Err(ImageReadError::InvalidHeader("no ne signature".into()));
        }
        debug!("{:#x?}: {:#x?}", header_offset, header);

        let resource_table_offset = header_offset + header.resource_table_offset as u64;
        let alignment_shift_count = read_at::<u16, R>(reader, resource_table_offset)?;
        debug!("{:#x?}: alignment shift count: {}", resource_table_offset, alignment_shift_count);
        // offsets are 16-bit, shifted they have to fit the 32-bit data entry address
        if alignment_shift_count > limits.max_alignment_shift.min(16) {
            return Err(ImageReadError::LimitExceeded(format!(
                "alignment shift count {}",
                alignment_shift_count
            )));
        }

        let mut resource_directory = ResourceDirectory::default();
        let mut type_count = 0usize;
        let mut resource_count = 0usize;
        loop {
            let type_id = read::<u16, R>(reader)?;
            if type_id == 0 {
                break;
            }
            type_count += 1;
            if type_count > limits.max_resource_types {
                return Err(ImageReadError::LimitExceeded(format!(
                    "more than {} resource types",
                    limits.max_resource_types
                )));
            }

            let count = read::<u16, R>(reader)?;
            let _reserved = read::<u32, R>(reader)?;
            let resource_type = ResourceId::Ordinal((type_id & !NE_INTEGER_ID_BIT) as u32);
            trace!(
                "- type {:#x?} ({}): {} resources",
                type_id,
                resource_type.ordinal().and_then(resource_type_name).unwrap_or("?"),
                count
            );
            if count as u32 > limits.max_directory_entries {
                return Err(ImageReadError::LimitExceeded(format!(
                    "resource type {:#x} has {} entries",
                    type_id, count
                )));
            }
            resource_count += count as usize;
            if resource_count > limits.max_resources {
                return Err(ImageReadError::LimitExceeded(format!(
                    "more than {} resources",
                    limits.max_resources
                )));
            }

            let mut resources = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let entry = read::<NeResourceEntry, R>(reader)?;
                trace!("-- {:#x?}", entry);
                let resource_id = entry.resource_id;
                if resource_id & NE_INTEGER_ID_BIT == 0 {
                    warn!("-- resource {:#x?} is named, treating as ordinal", resource_id);
                }
                resources.push(Resource {
                    name:     ResourceId::Ordinal((resource_id & !NE_INTEGER_ID_BIT) as u32),
                    language: ResourceId::Ordinal(0),
                    data:     DataEntry {
                        address: (entry.data_offset_shifted as u32) << alignment_shift_count,
                        size:    (entry.data_length as u32) << alignment_shift_count,
                    },
                });
            }
            resource_directory.insert(resource_type, resources);
        }
        debug!("{} resource types, {} resources", type_count, resource_count);

        Ok(Self {
            header,
            alignment_shift_count,
            resource_directory,
        })
    }

    /// Returns the parsed header.
    pub fn header(&self) -> &NeHeader { &self.header }

    /// Returns the shift count applied to resource offsets and lengths.
    pub fn alignment_shift_count(&self) -> u16 { self.alignment_shift_count }

    /// Returns the number of resource segments declared in the header.
    pub fn resource_segment_count(&self) -> u16 { self.header.resource_segment_count }
}

impl ResourceSource for NeImage {
    fn resource_directory(&self) -> &ResourceDirectory { &self.resource_directory }

    fn data_offset(&self, data: &DataEntry) -> Option<u64> { Some(data.address as u64) }
}
