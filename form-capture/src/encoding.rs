//! Data URI encoding of rasters
//!
//! Signatures travel as lossless PNG, photos as JPEG.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{RgbImage, RgbaImage};
use std::io::Cursor;

use crate::error::{CaptureResult, ImageProcessingError};

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

/// Build a `data:<mime>;base64,...` URI
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URI into its mime type and decoded payload
pub fn decode_data_uri(uri: &str) -> CaptureResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImageProcessingError::InvalidDataUri("missing data: scheme".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageProcessingError::InvalidDataUri("missing payload".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ImageProcessingError::InvalidDataUri("payload is not base64".into()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageProcessingError::InvalidDataUri(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}

pub fn encode_png(img: &RgbaImage) -> CaptureResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let encoder = image::codecs::png::PngEncoder::new(&mut cursor);
        img.write_with_encoder(encoder)
            .map_err(|e| ImageProcessingError::Encode(format!("png: {}", e)))?;
    }
    Ok(buffer)
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> CaptureResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
        img.write_with_encoder(encoder)
            .map_err(|e| ImageProcessingError::Encode(format!("jpeg: {}", e)))?;
    }
    Ok(buffer)
}
