//! Windows executable and bitmap constants.

#![allow(non_upper_case_globals)]

pub type DWORD = u32;
pub type WORD = u16;


// https://learn.microsoft.com/en-us/windows/win32/debug/pe-format

pub const DOS_MAGIC: WORD = 0x5a4d; // MZ
pub const PE_NT_SIGNATURE: DWORD = 0x00004550; // PE00
pub const PE_32_MAGIC: WORD = 0x010b;
pub const PE_64_MAGIC: WORD = 0x020b;
pub const PE_RESOURCE_DIRECTORY_INDEX: usize = 2;
pub const RESOURCE_SUBDIRECTORY_BIT: DWORD = 0x80000000;
pub const RESOURCE_NAME_BIT: DWORD = 0x80000000;


// http://www.fileformat.info/format/exe/corion-ne.htm

pub const NE_SIGNATURE: WORD = 0x454e; // NE
pub const NE_INTEGER_ID_BIT: WORD = 0x8000;


// https://docs.microsoft.com/en-us/windows/win32/menurc/resource-types

pub const RT_CURSOR: WORD = 0x01;
pub const RT_BITMAP: WORD = 0x02;
pub const RT_ICON: WORD = 0x03;
pub const RT_MENU: WORD = 0x04;
pub const RT_DIALOG: WORD = 0x05;
pub const RT_STRING: WORD = 0x06;
pub const RT_FONTDIR: WORD = 0x07;
pub const RT_FONT: WORD = 0x08;
pub const RT_ACCELERATOR: WORD = 0x09;
pub const RT_RCDATA: WORD = 0x0A;
pub const RT_MESSAGETABLE: WORD = 0x0B;
pub const RT_GROUP_CURSOR: WORD = 0x0C;
pub const RT_GROUP_ICON: WORD = 0x0E;
pub const RT_VERSION: WORD = 0x10;
pub const RT_DLGINCLUDE: WORD = 0x11;
pub const RT_PLUGPLAY: WORD = 0x13;
pub const RT_VXD: WORD = 0x14;
pub const RT_ANICURSOR: WORD = 0x15;
pub const RT_ANIICON: WORD = 0x16;
pub const RT_HTML: WORD = 0x17;
pub const RT_MANIFEST: WORD = 0x18;

/// Returns the symbolic name of a standard resource type ordinal.
pub fn resource_type_name(ordinal: u32) -> Option<&'static str> {
    let name = match u16::try_from(ordinal).ok()? {
        RT_CURSOR => "RT_CURSOR",
        RT_BITMAP => "RT_BITMAP",
        RT_ICON => "RT_ICON",
        RT_MENU => "RT_MENU",
        RT_DIALOG => "RT_DIALOG",
        RT_STRING => "RT_STRING",
        RT_FONTDIR => "RT_FONTDIR",
        RT_FONT => "RT_FONT",
        RT_ACCELERATOR => "RT_ACCELERATOR",
        RT_RCDATA => "RT_RCDATA",
        RT_MESSAGETABLE => "RT_MESSAGETABLE",
        RT_GROUP_CURSOR => "RT_GROUP_CURSOR",
        RT_GROUP_ICON => "RT_GROUP_ICON",
        RT_VERSION => "RT_VERSION",
        RT_DLGINCLUDE => "RT_DLGINCLUDE",
        RT_PLUGPLAY => "RT_PLUGPLAY",
        RT_VXD => "RT_VXD",
        RT_ANICURSOR => "RT_ANICURSOR",
        RT_ANIICON => "RT_ANIICON",
        RT_HTML => "RT_HTML",
        RT_MANIFEST => "RT_MANIFEST",
        _ => return None,
    };
    Some(name)
}


// https://learn.microsoft.com/en-us/windows/win32/api/wingdi/ns-wingdi-bitmapinfoheader

pub const BITMAP_INFO_HEADER_SIZE: DWORD = 40;
pub const BI_RGB: DWORD = 0;
pub const BI_RLE8: DWORD = 1;
pub const BI_RLE4: DWORD = 2;
pub const BI_BITFIELDS: DWORD = 3;


// https://www.w3.org/TR/png/#5PNG-file-signature

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
