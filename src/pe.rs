//! Portable executable image representation.
//!
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format> for more information.

use std::io::{Read, Seek};

use log::{debug, warn};

use crate::{constants::*, errors::*, options::*, resource::*, types::*, util::*};

/// Parsed headers, section table and resource tree of a 32-bit or 64-bit portable executable.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PeImage {
    pub(crate) coff_header:        CoffHeader,
    pub(crate) standard_header:    StandardHeader,
    pub(crate) windows_header:     GenericWindowsHeader,
    pub(crate) resource_table:     ImageDataDirectory,
    pub(crate) section_table:      Vec<SectionHeader>,
    pub(crate) resource_directory: ResourceDirectory,
}

impl PeImage {
    /// Parse a portable executable whose `PE\0\0` signature is at the given file offset.
    ///
    /// # Returns
    /// Returns the `PeImage`, or an error if the signature or optional header magic is invalid,
    /// the section table is too large, or the resource directory is not covered by any section.
    pub fn parse<R: Read + Seek>(
        reader: &mut R, new_header_offset: u32, limits: &Limits,
    ) -> Result<Self, ImageReadError> {
        let pe_signature_offset = new_header_offset as u64;
        let pe_signature = read_at::<u32, R>(reader, pe_signature_offset)?;
        debug!("pe_signature: {:#x?}", pe_signature);
        if pe_signature != PE_NT_SIGNATURE {
            return Err(ImageReadError::InvalidHeader("no pe signature".into()));
        }

        let coff_header_offset = pe_signature_offset + 4;
        let coff_header = read_at::<CoffHeader, R>(reader, coff_header_offset)?;
        debug!("{:#x?}: {:#x?}", coff_header_offset, coff_header);

        let standard_header_offset = coff_header_offset + 20;
        let standard_header = read_at::<StandardHeader, R>(reader, standard_header_offset)?;
        debug!("{:#x?}: {:#x?}", standard_header_offset, standard_header);

        let magic = standard_header.magic;
        let (windows_header, optional_header_dd_offset) = match magic {
            PE_32_MAGIC => {
                let windows_header =
                    read_at::<WindowsHeader<u32>, R>(reader, standard_header_offset + 28)?;
                (GenericWindowsHeader::WindowsHeader32(windows_header), standard_header_offset + 96)
            }
            PE_64_MAGIC => {
                let windows_header =
                    read_at::<WindowsHeader<u64>, R>(reader, standard_header_offset + 24)?;
                (GenericWindowsHeader::WindowsHeader64(windows_header), standard_header_offset + 112)
            }
            magic => {
                return Err(ImageReadError::UnsupportedFormat(format!(
                    "optional header magic {:#x}",
                    magic
                )))
            }
        };
        debug!("windows header: {:#x?}", windows_header);

        let resource_table = if (PE_RESOURCE_DIRECTORY_INDEX as u32)
            < windows_header.number_of_rva_and_sizes()
        {
            let offset = optional_header_dd_offset + (PE_RESOURCE_DIRECTORY_INDEX * 8) as u64;
            let data = read_at::<ImageDataDirectory, R>(reader, offset)?;
            debug!("{:#x?}: resource table: {:#x?}", offset, data);
            data
        } else {
            debug!("no resource data directory entry");
            ImageDataDirectory::default()
        };

        if coff_header.number_of_sections > limits.max_sections {
            return Err(ImageReadError::LimitExceeded(format!(
                "{} sections",
                { coff_header.number_of_sections }
            )));
        }
        let section_table_offset =
            standard_header_offset + coff_header.size_of_optional_header as u64;
        let mut section_table = Vec::with_capacity(coff_header.number_of_sections as usize);
        for index in 0..coff_header.number_of_sections {
            let section_header_offset = section_table_offset + (index as u64 * 40);
            let section_header = read_at::<SectionHeader, R>(reader, section_header_offset)?;
            debug!(
                "{:#x?}: {}: {:#x?}",
                section_header_offset,
                section_header.name().unwrap_or("?".to_string()),
                section_header
            );
            section_table.push(section_header);
        }

        let mut image = Self {
            coff_header,
            standard_header,
            windows_header,
            resource_table,
            section_table,
            resource_directory: ResourceDirectory::default(),
        };

        if resource_table.virtual_address > 0 && resource_table.size > 0 {
            let resource_offset =
                image.address_to_offset(resource_table.virtual_address).ok_or_else(|| {
                    ImageReadError::MissingSection(format!(
                        "no section contains resource directory {:#x}",
                        { resource_table.virtual_address }
                    ))
                })?;
            debug!("resource directory at file offset {:#x?}", resource_offset);
            image.resource_directory = ResourceDirectory::parse_pe(reader, resource_offset, limits)?;
        } else {
            warn!("image has no resource directory");
        }

        Ok(image)
    }

    /// Translate a relative virtual address to a file offset.
    ///
    /// # Returns
    /// Returns `None` if no section contains the address.
    /// If sections overlap, the first declared section is used.
    pub fn address_to_offset(&self, rva: u32) -> Option<u64> {
        self.section_for_address(rva).map(|section| {
            rva as u64 - section.virtual_address as u64 + section.pointer_to_raw_data as u64
        })
    }

    /// Returns the first declared section whose raw data contains the relative virtual address.
    pub fn section_for_address(&self, rva: u32) -> Option<&SectionHeader> {
        self.section_table.iter().find(|section| section.contains_address(rva))
    }

    /// Returns the parsed coff header.
    pub fn coff_header(&self) -> &CoffHeader { &self.coff_header }

    /// Returns the parsed standard header.
    pub fn standard_header(&self) -> &StandardHeader { &self.standard_header }

    /// Returns the parsed windows header.
    pub fn windows_header(&self) -> &GenericWindowsHeader { &self.windows_header }

    /// Returns whether the image uses the 64-bit optional header layout.
    pub fn is_pe32_plus(&self) -> bool { self.windows_header.is_pe32_plus() }

    /// Returns the resource data directory entry.
    pub fn resource_table(&self) -> &ImageDataDirectory { &self.resource_table }

    /// Returns all section headers in declaration order.
    pub fn section_table(&self) -> &[SectionHeader] { &self.section_table }
}

impl ResourceSource for PeImage {
    fn resource_directory(&self) -> &ResourceDirectory { &self.resource_directory }

    fn data_offset(&self, data: &DataEntry) -> Option<u64> { self.address_to_offset(data.address) }
}
