//! Freehand signature surface
//!
//! Strokes are traced in display units and rasterized at device resolution:
//! a 300×120 surface on a 2× display has a 600×240 backing image, and the
//! 2-unit pen becomes 4 pixels wide. Every segment is drawn as a capsule,
//! which gives round caps and round joins for free.

use image::{Rgba, RgbaImage};
use tracing::{debug, instrument};

use crate::encoding::{PNG_MIME, decode_data_uri, encode_png, to_data_uri};
use crate::error::{CaptureResult, ImageProcessingError};
use crate::input::{Point, StrokeCommand};

/// Pen width in display units
pub const STROKE_WIDTH: f32 = 2.0;

const INK: [u8; 3] = [0, 0, 0];

/// Change emitted by the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOutput {
    /// PNG data URI of the whole surface
    Signed(String),
    /// Surface erased, no signature
    Cleared,
}

impl SurfaceOutput {
    /// Value to store in the signature slot
    pub fn into_slot_value(self) -> Option<String> {
        match self {
            SurfaceOutput::Signed(uri) => Some(uri),
            SurfaceOutput::Cleared => None,
        }
    }
}

/// Raster drawing surface for one signature box
#[derive(Debug, Clone)]
pub struct SignaturePad {
    ratio: f32,
    canvas: RgbaImage,
    /// Last point of the active stroke
    cursor: Option<Point>,
    inked: bool,
}

impl SignaturePad {
    /// Create a surface of `width × height` display units
    ///
    /// The backing image is scaled by `device_pixel_ratio` (at least 1).
    /// A previously captured signature is redrawn after scaling, stretched
    /// over the whole surface.
    #[instrument(skip(existing), fields(has_existing = existing.is_some()))]
    pub fn mount(
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
        existing: Option<&str>,
    ) -> CaptureResult<Self> {
        if width == 0 || height == 0 {
            return Err(ImageProcessingError::InvalidSize(width, height));
        }

        let ratio = if device_pixel_ratio.is_finite() {
            device_pixel_ratio.max(1.0)
        } else {
            1.0
        };
        let backing_w = ((width as f32) * ratio).round().max(1.0) as u32;
        let backing_h = ((height as f32) * ratio).round().max(1.0) as u32;

        let mut pad = Self {
            ratio,
            canvas: RgbaImage::new(backing_w, backing_h),
            cursor: None,
            inked: false,
        };

        if let Some(uri) = existing {
            pad.redraw(uri)?;
        }

        debug!(backing_w, backing_h, ratio, "signature surface mounted");
        Ok(pad)
    }

    fn redraw(&mut self, uri: &str) -> CaptureResult<()> {
        let (_, bytes) = decode_data_uri(uri)?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| ImageProcessingError::Decode(e.to_string()))?;
        let (w, h) = self.canvas.dimensions();
        let scaled = img
            .resize_exact(w, h, image::imageops::FilterType::Triangle)
            .to_rgba8();
        image::imageops::overlay(&mut self.canvas, &scaled, 0, 0);
        self.inked = true;
        Ok(())
    }

    /// Start a stroke; nothing is drawn until the first `extend`
    pub fn begin(&mut self, point: Point) {
        self.cursor = Some(point);
    }

    /// Draw a segment from the last point; ignored without an active stroke
    pub fn extend(&mut self, point: Point) {
        let Some(from) = self.cursor else {
            return;
        };
        self.draw_segment(from, point);
        self.cursor = Some(point);
        self.inked = true;
    }

    /// Finish the active stroke and encode the surface
    ///
    /// Returns `None` when no stroke was active, so a stray pointer-up or a
    /// second `end` never emits.
    pub fn end(&mut self) -> CaptureResult<Option<SurfaceOutput>> {
        if self.cursor.take().is_none() {
            return Ok(None);
        }
        Ok(Some(SurfaceOutput::Signed(self.to_png_data_uri()?)))
    }

    /// Erase everything
    pub fn clear(&mut self) -> SurfaceOutput {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.cursor = None;
        self.inked = false;
        SurfaceOutput::Cleared
    }

    pub fn apply(&mut self, command: StrokeCommand) -> CaptureResult<Option<SurfaceOutput>> {
        match command {
            StrokeCommand::Begin(p) => {
                self.begin(p);
                Ok(None)
            }
            StrokeCommand::Extend(p) => {
                self.extend(p);
                Ok(None)
            }
            StrokeCommand::End => self.end(),
            StrokeCommand::Clear => Ok(Some(self.clear())),
        }
    }

    /// Nothing has been drawn (the Clear button is disabled in this state)
    pub fn is_empty(&self) -> bool {
        !self.inked
    }

    pub fn is_drawing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn to_png_data_uri(&self) -> CaptureResult<String> {
        let png = encode_png(&self.canvas)?;
        Ok(to_data_uri(PNG_MIME, &png))
    }

    fn draw_segment(&mut self, from: Point, to: Point) {
        let (ax, ay) = (from.x * self.ratio, from.y * self.ratio);
        let (bx, by) = (to.x * self.ratio, to.y * self.ratio);
        let radius = STROKE_WIDTH * self.ratio / 2.0;

        let (w, h) = self.canvas.dimensions();
        let reach = radius + 1.0;
        let min_x = (ax.min(bx) - reach).floor().max(0.0) as u32;
        let min_y = (ay.min(by) - reach).floor().max(0.0) as u32;
        let max_x = (ax.max(bx) + reach).ceil().min(w as f32) as u32;
        let max_y = (ay.max(by) + reach).ceil().min(h as f32) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let d = distance_to_segment(x as f32 + 0.5, y as f32 + 0.5, ax, ay, bx, by);
                // one pixel of anti-aliasing at the edge
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let alpha = (coverage * 255.0).round() as u8;
                let pixel = self.canvas.get_pixel_mut(x, y);
                let merged = pixel[3].max(alpha);
                *pixel = Rgba([INK[0], INK[1], INK[2], merged]);
            }
        }
    }
}

fn distance_to_segment(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_pixels(pad: &SignaturePad) -> usize {
        pad.image().pixels().filter(|p| p[3] > 0).count()
    }

    fn signed(output: Option<SurfaceOutput>) -> String {
        match output {
            Some(SurfaceOutput::Signed(uri)) => uri,
            other => panic!("expected signature, got {:?}", other),
        }
    }

    #[test]
    fn test_backing_scaled_by_ratio() {
        let pad = SignaturePad::mount(300, 120, 2.0, None).unwrap();
        assert_eq!(pad.backing_size(), (600, 240));

        // ratios below 1 are clamped
        let pad = SignaturePad::mount(300, 120, 0.5, None).unwrap();
        assert_eq!(pad.backing_size(), (300, 120));

        assert!(SignaturePad::mount(0, 120, 1.0, None).is_err());
    }

    #[test]
    fn test_end_without_begin_emits_nothing() {
        let mut pad = SignaturePad::mount(100, 50, 1.0, None).unwrap();
        assert_eq!(pad.end().unwrap(), None);

        pad.extend(Point::new(10.0, 10.0));
        assert_eq!(pad.end().unwrap(), None);
        assert!(pad.is_empty());
    }

    #[test]
    fn test_second_end_emits_nothing() {
        let mut pad = SignaturePad::mount(100, 50, 1.0, None).unwrap();
        pad.begin(Point::new(10.0, 10.0));
        pad.extend(Point::new(60.0, 30.0));
        let uri = signed(pad.end().unwrap());
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(pad.end().unwrap(), None);
    }

    #[test]
    fn test_begin_alone_draws_nothing() {
        let mut pad = SignaturePad::mount(100, 50, 1.0, None).unwrap();
        pad.begin(Point::new(10.0, 10.0));
        assert_eq!(ink_pixels(&pad), 0);
        assert!(pad.is_drawing());
    }

    #[test]
    fn test_stroke_width_follows_ratio() {
        let mut pad = SignaturePad::mount(100, 50, 1.0, None).unwrap();
        pad.begin(Point::new(10.0, 25.0));
        pad.extend(Point::new(90.0, 25.0));
        let thin = ink_pixels(&pad);

        let mut hidpi = SignaturePad::mount(100, 50, 2.0, None).unwrap();
        hidpi.begin(Point::new(10.0, 25.0));
        hidpi.extend(Point::new(90.0, 25.0));
        let thick = ink_pixels(&hidpi);

        // twice as long and twice as wide
        assert!(thick > thin * 3, "thin={thin} thick={thick}");

        // the line center is fully opaque, far away is untouched
        assert_eq!(pad.image().get_pixel(50, 25)[3], 255);
        assert_eq!(pad.image().get_pixel(50, 5)[3], 0);
    }

    #[test]
    fn test_round_cap_extends_past_endpoint() {
        let mut pad = SignaturePad::mount(100, 50, 4.0, None).unwrap();
        pad.begin(Point::new(20.0, 10.0));
        pad.extend(Point::new(30.0, 10.0));
        // radius is 4px at ratio 4; the cap reaches 3px left of the start
        assert!(pad.image().get_pixel(77, 40)[3] > 0);
        assert_eq!(pad.image().get_pixel(70, 40)[3], 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut pad = SignaturePad::mount(100, 50, 1.0, None).unwrap();
        pad.begin(Point::new(5.0, 5.0));
        pad.extend(Point::new(50.0, 40.0));
        pad.end().unwrap();
        assert!(!pad.is_empty());

        for _ in 0..3 {
            assert_eq!(pad.clear(), SurfaceOutput::Cleared);
            assert!(pad.is_empty());
            assert_eq!(ink_pixels(&pad), 0);
        }
        assert_eq!(pad.clear().into_slot_value(), None);
    }

    #[test]
    fn test_clear_cancels_active_stroke() {
        let mut pad = SignaturePad::mount(100, 50, 1.0, None).unwrap();
        pad.apply(StrokeCommand::Begin(Point::new(5.0, 5.0))).unwrap();
        pad.apply(StrokeCommand::Clear).unwrap();
        assert_eq!(pad.apply(StrokeCommand::End).unwrap(), None);
    }

    #[test]
    fn test_existing_signature_redrawn_after_rescale() {
        let mut original = SignaturePad::mount(100, 50, 1.0, None).unwrap();
        original.begin(Point::new(10.0, 25.0));
        original.extend(Point::new(90.0, 25.0));
        let uri = signed(original.end().unwrap());

        let pad = SignaturePad::mount(100, 50, 2.0, Some(&uri)).unwrap();
        assert_eq!(pad.backing_size(), (200, 100));
        assert!(!pad.is_empty());
        // same stroke, now at device scale
        assert!(pad.image().get_pixel(100, 50)[3] > 0);
        assert_eq!(pad.image().get_pixel(100, 10)[3], 0);
    }

    #[test]
    fn test_mount_rejects_broken_existing_image() {
        let err = SignaturePad::mount(100, 50, 1.0, Some("data:image/png;base64,AAAA")).unwrap_err();
        assert!(matches!(err, ImageProcessingError::Decode(_)));
    }

    #[test]
    fn test_distance_to_degenerate_segment() {
        assert_eq!(distance_to_segment(3.0, 4.0, 0.0, 0.0, 0.0, 0.0), 5.0);
        assert_eq!(distance_to_segment(5.0, 1.0, 0.0, 0.0, 10.0, 0.0), 1.0);
    }
}
