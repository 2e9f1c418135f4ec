//! # form-capture
//!
//! Signature and photo capture for the cleanroom import form.
//!
//! ## Scope
//!
//! This crate handles HOW images are captured:
//! - Pointer/touch normalization into element-local points
//! - Freehand stroke rasterization at device pixel ratio
//! - PNG / JPEG data URI encoding
//! - Photo downscaling
//!
//! Which slot an image lands in and when it is persisted stays in
//! form-client.
//!
//! ## Example
//!
//! ```ignore
//! use form_capture::{Point, SignaturePad, SurfaceOutput};
//!
//! let mut pad = SignaturePad::mount(320, 120, 2.0, None)?;
//! pad.begin(Point::new(10.0, 60.0));
//! pad.extend(Point::new(200.0, 80.0));
//! if let Some(SurfaceOutput::Signed(png)) = pad.end()? {
//!     record.signatures.sig_requester = Some(png);
//! }
//! ```

mod encoding;
mod error;
mod input;
mod photo;
mod surface;

// Re-exports
pub use encoding::{JPEG_MIME, PNG_MIME, decode_data_uri, to_data_uri};
pub use error::{CaptureResult, ImageProcessingError};
pub use input::{ElementRect, Point, PointerInput, PointerPhase, StrokeCommand};
pub use photo::{MAX_PHOTO_DIMENSION, PHOTO_JPEG_QUALITY, ProcessedPhoto, fit_within, process_photo};
pub use surface::{STROKE_WIDTH, SignaturePad, SurfaceOutput};
