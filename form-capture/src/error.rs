//! Error types for the capture library

use thiserror::Error;

/// Image capture / processing errors
///
/// Callers keep their previous photo or signature when they see one of these.
#[derive(Debug, Error)]
pub enum ImageProcessingError {
    /// Selected file has no content
    #[error("Empty image file")]
    Empty,

    /// Bytes could not be decoded as an image
    #[error("Unreadable image: {0}")]
    Decode(String),

    /// Raster could not be encoded
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Not a `data:<mime>;base64,<payload>` URI
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Drawing surface with zero area
    #[error("Invalid surface size: {0}x{1}")]
    InvalidSize(u32, u32),
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, ImageProcessingError>;
