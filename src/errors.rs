//! Errors specific to reading executables and decoding their icons.

use std::io::Error as IOError;

#[cfg(feature = "images")]
use image::ImageError;

/// Error that can occur when reading and parsing bytes.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ReadError(pub String);

/// Errors that can occur when reading an executable image and its resources.
#[derive(Debug, thiserror::Error)]
pub enum ImageReadError {
    #[error("invalid bytes: {0}")]
    InvalidBytes(ReadError),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("missing section: {0}")]
    MissingSection(String),
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<ReadError> for ImageReadError {
    fn from(error: ReadError) -> Self { ImageReadError::InvalidBytes(error) }
}
impl From<IOError> for ImageReadError {
    fn from(error: IOError) -> Self { ImageReadError::IOError(error) }
}

/// Errors that can occur when decoding an icon image into a raster.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("no icon selected")]
    NoIcon,
    #[error("invalid bytes: {0}")]
    InvalidBytes(ReadError),
    #[error("unsupported bitmap: {0}")]
    Unsupported(String),
    #[error("invalid dimensions: {0}x{1}")]
    InvalidDimensions(i64, i64),
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    #[cfg(feature = "images")]
    #[error("invalid png: {0}")]
    InvalidPng(ImageError),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<ReadError> for DecodeError {
    fn from(error: ReadError) -> Self { DecodeError::InvalidBytes(error) }
}
#[cfg(feature = "images")]
impl From<ImageError> for DecodeError {
    fn from(error: ImageError) -> Self { DecodeError::InvalidPng(error) }
}
impl From<IOError> for DecodeError {
    fn from(error: IOError) -> Self { DecodeError::IOError(error) }
}
