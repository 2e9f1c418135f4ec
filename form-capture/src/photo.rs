//! Part photo processing
//!
//! The selected file is decoded, shrunk so its longer side is at most
//! [`MAX_PHOTO_DIMENSION`] and stored as a JPEG data URI.

use image::GenericImageView;
use tracing::{info, instrument, warn};

use crate::encoding::{JPEG_MIME, encode_jpeg, to_data_uri};
use crate::error::{CaptureResult, ImageProcessingError};

/// Longest side of a stored photo
pub const MAX_PHOTO_DIMENSION: u32 = 1600;

/// JPEG quality for photos (0.9)
pub const PHOTO_JPEG_QUALITY: u8 = 90;

/// Encoded photo ready for the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPhoto {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Target size that fits inside `max × max`, aspect preserved, never upscaled
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = max as f64 / width.max(height) as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max);
    (w, h)
}

/// Decode, downscale and re-encode a selected image file
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn process_photo(bytes: &[u8]) -> CaptureResult<ProcessedPhoto> {
    if bytes.is_empty() {
        return Err(ImageProcessingError::Empty);
    }

    let img = image::load_from_memory(bytes).map_err(|e| {
        warn!(error = %e, "photo decode failed");
        ImageProcessingError::Decode(e.to_string())
    })?;

    let (w, h) = img.dimensions();
    let (new_w, new_h) = fit_within(w, h, MAX_PHOTO_DIMENSION);
    let resized = if (new_w, new_h) == (w, h) {
        img
    } else {
        img.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle)
    };

    let jpeg = encode_jpeg(&resized.to_rgb8(), PHOTO_JPEG_QUALITY)?;
    info!(
        from = ?(w, h),
        to = ?(new_w, new_h),
        encoded = jpeg.len(),
        "photo processed"
    );

    Ok(ProcessedPhoto {
        data_uri: to_data_uri(JPEG_MIME, &jpeg),
        width: new_w,
        height: new_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::decode_data_uri;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_fit_within_caps_longer_side() {
        assert_eq!(fit_within(3000, 2000, 1600), (1600, 1067));
        assert_eq!(fit_within(2000, 3000, 1600), (1067, 1600));
        assert_eq!(fit_within(800, 600, 1600), (800, 600));
        assert_eq!(fit_within(1600, 1600, 1600), (1600, 1600));
        assert_eq!(fit_within(10000, 1, 1600), (1600, 1));
    }

    #[test]
    fn test_large_photo_downscaled() {
        let photo = process_photo(&png_bytes(1800, 1200)).unwrap();
        assert_eq!((photo.width, photo.height), (1600, 1067));

        let (mime, bytes) = decode_data_uri(&photo.data_uri).unwrap();
        assert_eq!(mime, "image/jpeg");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (1600, 1067));
    }

    #[test]
    fn test_small_photo_not_upscaled() {
        let photo = process_photo(&png_bytes(800, 600)).unwrap();
        assert_eq!((photo.width, photo.height), (800, 600));
        assert!(photo.data_uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_unreadable_file() {
        assert!(matches!(process_photo(&[]), Err(ImageProcessingError::Empty)));
        assert!(matches!(
            process_photo(b"definitely not an image"),
            Err(ImageProcessingError::Decode(_))
        ));
    }
}
