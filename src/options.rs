//! Extraction options and bounds on work done for untrusted input.

/// Upper bounds applied while parsing an executable.
///
/// Executables are untrusted input. Every count read from the file is checked against these
/// bounds before anything is allocated for it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Limits {
    /// Maximum number of sections in a PE section table.
    pub max_sections:          u16,
    /// Maximum number of entries in a single resource directory table or NE resource type.
    pub max_directory_entries: u32,
    /// Maximum number of resources collected for one executable.
    pub max_resources:         usize,
    /// Maximum number of resource types in an NE resource table.
    pub max_resource_types:    usize,
    /// Maximum number of entries in an icon group.
    pub max_icon_entries:      u16,
    /// Maximum width and height of a decoded icon.
    pub max_icon_dimension:    u32,
    /// Maximum number of bytes read for a single embedded PNG image.
    pub max_resource_size:     u32,
    /// Maximum NE alignment shift count.
    pub max_alignment_shift:   u16,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_sections:          96,
            max_directory_entries: 4096,
            max_resources:         65536,
            max_resource_types:    256,
            max_icon_entries:      256,
            max_icon_dimension:    1024,
            max_resource_size:     16 * 1024 * 1024,
            max_alignment_shift:   16,
        }
    }
}

/// Options for [`best_icon_raster`](crate::best_icon_raster).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ExtractOptions {
    /// Width the icon is going to be displayed at.
    pub target_width:  u32,
    /// Height the icon is going to be displayed at.
    /// Selection only considers the width, since icons are square in practice.
    pub target_height: u32,
    pub limits:        Limits,
}
impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            target_width:  128,
            target_height: 128,
            limits:        Limits::default(),
        }
    }
}
impl ExtractOptions {
    /// Returns options targeting the given display size with default limits.
    pub fn with_target_size(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
            ..Self::default()
        }
    }
}
