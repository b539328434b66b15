use core::any::type_name;
use std::io::{Read, Seek, SeekFrom};

use zerocopy::FromBytes;

use crate::{DecodeError, ReadError};

/// Reads a structure at the current position of the reader.
pub fn read<T: FromBytes + Copy, R: Read>(reader: &mut R) -> Result<T, ReadError> {
    let mut buffer = vec![0u8; core::mem::size_of::<T>()];
    reader
        .read_exact(&mut buffer)
        .map_err(|_| ReadError(format!("short read of {}", type_name::<T>())))?;
    T::read_from_prefix(&buffer)
        .map_err(|_| ReadError(type_name::<T>().to_string()))
        .map(|(value, _)| value)
}

/// Reads a structure at the absolute file offset.
pub fn read_at<T: FromBytes + Copy, R: Read + Seek>(
    reader: &mut R, offset: u64,
) -> Result<T, ReadError> {
    seek(reader, offset)?;
    read::<T, R>(reader).map_err(|e| ReadError(format!("{} at {:#x}", e.0, offset)))
}

/// Reads exactly `length` bytes at the current position of the reader.
pub fn read_bytes<R: Read>(reader: &mut R, length: usize) -> Result<Vec<u8>, ReadError> {
    let mut buffer = Vec::new();
    let read = reader
        .by_ref()
        .take(length as u64)
        .read_to_end(&mut buffer)
        .map_err(|e| ReadError(format!("reading {} bytes: {}", length, e)))?;
    if read != length {
        return Err(ReadError(format!("short read: {} of {} bytes", read, length)));
    }
    Ok(buffer)
}

/// Reads exactly `length` bytes at the absolute file offset.
pub fn read_bytes_at<R: Read + Seek>(
    reader: &mut R, offset: u64, length: usize,
) -> Result<Vec<u8>, ReadError> {
    seek(reader, offset)?;
    read_bytes(reader, length).map_err(|e| ReadError(format!("{} at {:#x}", e.0, offset)))
}

/// Reads up to `length` bytes at the absolute file offset without failing on a short read.
pub fn peek_at<R: Read + Seek>(
    reader: &mut R, offset: u64, length: usize,
) -> Result<Vec<u8>, ReadError> {
    seek(reader, offset)?;
    let mut buffer = Vec::with_capacity(length);
    reader
        .by_ref()
        .take(length as u64)
        .read_to_end(&mut buffer)
        .map_err(|e| ReadError(format!("peeking {} bytes at {:#x}: {}", length, offset, e)))?;
    Ok(buffer)
}

pub fn seek<R: Seek>(reader: &mut R, offset: u64) -> Result<(), ReadError> {
    reader
        .seek(SeekFrom::Start(offset))
        .map(|_| ())
        .map_err(|e| ReadError(format!("seeking to {:#x}: {}", offset, e)))
}

/// Reads one row of `stride` bytes into the buffer.
pub fn read_row<R: Read>(reader: &mut R, row: &mut [u8]) -> Result<(), DecodeError> {
    reader.read_exact(row).map_err(|_| {
        DecodeError::InvalidBytes(ReadError(format!("short read of {} byte row", row.len())))
    })
}

/// Returns the number of bytes in a bitmap row padded to a 32-bit boundary.
pub fn row_stride(width: u32, bits_per_pixel: u32) -> usize {
    (((width as usize * bits_per_pixel as usize) + 31) & !31) / 8
}
