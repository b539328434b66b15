//! Data types for the resources of an executable.
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#the-rsrc-section> for the
//! portable executable resource tree.

use std::io::{Read, Seek};

use ahash::RandomState;
use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::{constants::*, errors::*, options::*, types::*, util::*};

/// Resource identifier.
/// Only numeric identifiers are ever matched. Named entries keep the unresolved offset of their name.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ResourceId {
    // numeric ordinal
    Ordinal(u32),
    // offset of the name string in the resource section
    Name(u32),
}
impl ResourceId {
    /// Interpret a raw PE directory entry identifier.
    pub fn from_raw(raw: u32) -> Self {
        if raw & RESOURCE_NAME_BIT != 0 {
            Self::Name(raw & !RESOURCE_NAME_BIT)
        } else {
            Self::Ordinal(raw)
        }
    }

    /// Returns the numeric ordinal, or `None` for named resources.
    pub fn ordinal(&self) -> Option<u32> {
        match self {
            Self::Ordinal(ordinal) => Some(*ordinal),
            Self::Name(_) => None,
        }
    }
}
impl From<u16> for ResourceId {
    fn from(ordinal: u16) -> Self { Self::Ordinal(ordinal as u32) }
}

/// Location of a contiguous resource payload.
///
/// For portable executables the address is a relative virtual address,
/// for segmented executables it is the file offset.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct DataEntry {
    pub address: u32,
    pub size:    u32,
}

/// A single resource leaf.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Resource {
    pub name:     ResourceId,
    pub language: ResourceId,
    pub data:     DataEntry,
}

/// Resources of an executable, grouped by resource type in file order.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceDirectory {
    pub(crate) types: IndexMap<ResourceId, Vec<Resource>, RandomState>,
}
impl ResourceDirectory {
    /// Returns the resources of the given type, or an empty slice if there are none.
    pub fn get<I: Into<ResourceId>>(&self, resource_type: I) -> &[Resource] {
        self.types.get(&resource_type.into()).map(|resources| &resources[..]).unwrap_or(&[])
    }

    /// Returns the first resource of the given type.
    pub fn first<I: Into<ResourceId>>(&self, resource_type: I) -> Option<&Resource> {
        self.get(resource_type).first()
    }

    /// Returns the first resource of the given type with the numeric identifier.
    pub fn find<I: Into<ResourceId>>(&self, resource_type: I, ordinal: u32) -> Option<&Resource> {
        self.get(resource_type).iter().find(|resource| resource.name == ResourceId::Ordinal(ordinal))
    }

    /// Returns all resource types in file order.
    pub fn types(&self) -> Vec<&ResourceId> { self.types.keys().collect() }

    /// Returns the total number of resources.
    pub fn len(&self) -> usize { self.types.values().map(Vec::len).sum() }

    /// Returns whether the directory contains no resources.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub(crate) fn insert(&mut self, resource_type: ResourceId, resources: Vec<Resource>) {
        self.types.entry(resource_type).or_default().extend(resources);
    }

    /// Parse the portable executable resource tree whose root table is at the given file offset.
    ///
    /// Exactly three levels are walked: type, name and language.
    /// Subdirectory offsets are relative to `base_offset`.
    /// Data entry addresses are kept as relative virtual addresses.
    ///
    /// # Returns
    /// Returns an error if the root table can not be read or a limit is exceeded.
    /// Unreadable subtrees are skipped.
    pub fn parse_pe<R: Read + Seek>(
        reader: &mut R, base_offset: u64, limits: &Limits,
    ) -> Result<Self, ImageReadError> {
        let mut directory = Self::default();
        let mut count = 0usize;

        let level1 = read_table(reader, base_offset, 0, limits, 1)?;
        for entry1 in level1 {
            let resource_type = ResourceId::from_raw(entry1.name_offset_or_integer_id);
            let Some(offset1) = subdirectory_offset(&entry1) else {
                warn!("- ignoring resource data at type level: {:?}", resource_type);
                continue;
            };
            trace!(
                "- type {:?} ({})",
                resource_type,
                resource_type.ordinal().and_then(resource_type_name).unwrap_or("?")
            );

            let level2 = match read_table(reader, base_offset, offset1, limits, 2) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("-- skipping resource type {:?}: {}", resource_type, e);
                    continue;
                }
            };

            let mut resources = Vec::new();
            for entry2 in level2 {
                let name = ResourceId::from_raw(entry2.name_offset_or_integer_id);
                let Some(offset2) = subdirectory_offset(&entry2) else {
                    warn!("-- ignoring resource data at name level: {:?}", name);
                    continue;
                };

                let level3 = match read_table(reader, base_offset, offset2, limits, 3) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("--- skipping resource {:?}: {}", name, e);
                        continue;
                    }
                };

                for entry3 in level3 {
                    let language = ResourceId::from_raw(entry3.name_offset_or_integer_id);
                    // the tree is never followed below the language level
                    if subdirectory_offset(&entry3).is_some() {
                        warn!("--- ignoring nested directory at language level: {:?}", language);
                        continue;
                    }
                    let data_offset = base_offset + entry3.data_entry_or_subdirectory_offset as u64;
                    let data = match read_at::<ResourceDataEntry, R>(reader, data_offset) {
                        Ok(data) => data,
                        Err(e) => {
                            warn!("--- skipping resource data {:?}/{:?}: {}", name, language, e);
                            continue;
                        }
                    };
                    trace!("--- {:?}/{:?}: {:#x?}", name, language, data);

                    count += 1;
                    if count > limits.max_resources {
                        return Err(ImageReadError::LimitExceeded(format!(
                            "more than {} resources",
                            limits.max_resources
                        )));
                    }
                    resources.push(Resource {
                        name,
                        language,
                        data: DataEntry {
                            address: data.data_rva,
                            size:    data.size,
                        },
                    });
                }
            }

            debug!("resource type {:?}: {} resources", resource_type, resources.len());
            directory.insert(resource_type, resources);
        }

        Ok(directory)
    }
}

fn subdirectory_offset(entry: &ResourceDirectoryEntry) -> Option<u32> {
    let offset = entry.data_entry_or_subdirectory_offset;
    if offset & RESOURCE_SUBDIRECTORY_BIT != 0 {
        Some(offset & !RESOURCE_SUBDIRECTORY_BIT)
    } else {
        None
    }
}

/// Reads a directory table and its entries, name entries first followed by id entries.
fn read_table<R: Read + Seek>(
    reader: &mut R, base_offset: u64, directory_offset: u32, limits: &Limits, level: usize,
) -> Result<Vec<ResourceDirectoryEntry>, ImageReadError> {
    let table_offset = base_offset + directory_offset as u64;
    let table = read_at::<ResourceDirectoryTable, R>(reader, table_offset)?;
    trace!("{} {:#x?}", "--".repeat(level), table);

    let count = table.number_of_name_entries as u32 + table.number_of_id_entries as u32;
    if count > limits.max_directory_entries {
        return Err(ImageReadError::LimitExceeded(format!(
            "resource table at {:#x} has {} entries",
            table_offset, count
        )));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        entries.push(read::<ResourceDirectoryEntry, R>(reader)?);
    }
    Ok(entries)
}

/// Source of resources that can locate resource payloads in the file.
pub trait ResourceSource {
    /// Returns the resources of the executable.
    fn resource_directory(&self) -> &ResourceDirectory;

    /// Returns the file offset of the resource payload, or `None` if it can not be located.
    fn data_offset(&self, data: &DataEntry) -> Option<u64>;

    /// Reads the raw payload of a resource.
    fn read_resource<R: Read + Seek>(
        &self, reader: &mut R, resource: &Resource,
    ) -> Result<Vec<u8>, ImageReadError> {
        let offset = self.data_offset(&resource.data).ok_or_else(|| {
            ImageReadError::MissingSection(format!(
                "no section contains address {:#x}",
                resource.data.address
            ))
        })?;
        Ok(read_bytes_at(reader, offset, resource.data.size as usize)?)
    }
}
