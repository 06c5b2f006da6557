//! # Frame Buffer
//!
//! Single slot holding the most recent valid camera frame. Every accepted frame replaces the
//! previous one, nothing is queued, so the control cycle always works on the newest image.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::eqpt::cam::{ImageMsg, PixelEncoding};
use image::{Bgr, ImageBuffer, RgbImage};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Internal working image format, 8 bit BGR.
pub type BgrImage = ImageBuffer<Bgr<u8>, Vec<u8>>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A decoded camera frame in the working colour order.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Time at which the frame was accepted
    pub timestamp: DateTime<Utc>,

    /// The pixels
    pub image: BgrImage
}

/// The most recently received frame, or nothing before the first valid frame arrives.
#[derive(Default, Debug)]
pub struct FrameBuffer {
    slot: Option<Frame>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons an inbound image is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Row stride of {step} bytes is shorter than a row of {width} pixels")]
    StrideTooShort { step: u32, width: u32 },

    #[error("Declared size of {expected:?} bytes does not match the {actual} bytes received")]
    LengthMismatch { expected: Option<usize>, actual: usize }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Frame {
    /// Decode an image message, converting it to BGR.
    ///
    /// The declared width, height and stride are checked against the data length before anything
    /// is copied.
    pub fn from_msg(msg: &ImageMsg) -> Result<Self, FrameError> {
        if msg.width == 0 || msg.height == 0 {
            return Err(FrameError::EmptyImage { width: msg.width, height: msg.height })
        }

        let row_bytes = msg.width as usize * msg.encoding.bytes_per_pixel() as usize;
        let step = msg.step as usize;

        if step < row_bytes {
            return Err(FrameError::StrideTooShort { step: msg.step, width: msg.width })
        }

        let expected = step.checked_mul(msg.height as usize);
        if expected != Some(msg.data.len()) {
            return Err(FrameError::LengthMismatch { expected, actual: msg.data.len() })
        }

        let mut pixels = Vec::with_capacity(row_bytes * msg.height as usize);
        for row in msg.data.chunks_exact(step) {
            // Padding at the end of each row is dropped
            let row = &row[..row_bytes];
            match msg.encoding {
                PixelEncoding::Bgr8 => pixels.extend_from_slice(row),
                PixelEncoding::Rgb8 => {
                    for px in row.chunks_exact(3) {
                        pixels.extend_from_slice(&[px[2], px[1], px[0]]);
                    }
                }
            }
        }

        // Length is width * height * 3 by construction
        let image = BgrImage::from_raw(msg.width, msg.height, pixels)
            .ok_or(FrameError::LengthMismatch { expected, actual: msg.data.len() })?;

        Ok(Self {
            timestamp: Utc::now(),
            image
        })
    }

    /// Width of the frame in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the frame in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Copy the frame into an RGB image, used for encoding and display.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut rgb = RgbImage::new(self.width(), self.height());
        for (dst, src) in rgb.pixels_mut().zip(self.image.pixels()) {
            let [b, g, r] = src.0;
            dst.0 = [r, g, b];
        }
        rgb
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first valid frame has been stored.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// The most recent frame.
    pub fn latest(&self) -> Option<&Frame> {
        self.slot.as_ref()
    }

    /// Replace the content of the buffer with the given frame.
    pub fn store(&mut self, frame: Frame) {
        self.slot = Some(frame);
    }

    /// Decode and store an inbound image.
    ///
    /// A malformed image is rejected and the buffer keeps its last valid frame.
    pub fn intake(&mut self, msg: &ImageMsg) -> Result<(), FrameError> {
        let frame = Frame::from_msg(msg)?;
        self.store(frame);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn msg(width: u32, height: u32, step: u32, encoding: PixelEncoding, data: Vec<u8>) -> ImageMsg {
        ImageMsg { width, height, step, encoding, data }
    }

    #[test]
    fn test_rgb_converted_to_bgr() {
        let mut fb = FrameBuffer::new();
        assert!(fb.is_empty());

        fb.intake(&msg(2, 1, 6, PixelEncoding::Rgb8, vec![1, 2, 3, 4, 5, 6])).unwrap();

        let frame = fb.latest().unwrap();
        assert_eq!(frame.image.get_pixel(0, 0).0, [3, 2, 1]);
        assert_eq!(frame.image.get_pixel(1, 0).0, [6, 5, 4]);
        assert_eq!(frame.to_rgb_image().get_pixel(1, 0).0, [4, 5, 6]);
    }

    #[test]
    fn test_stride_padding_dropped() {
        let mut fb = FrameBuffer::new();

        // 1 pixel wide, 2 rows, 2 bytes of padding per row
        let data = vec![10, 20, 30, 0, 0, 40, 50, 60, 0, 0];
        fb.intake(&msg(1, 2, 5, PixelEncoding::Bgr8, data)).unwrap();

        let frame = fb.latest().unwrap();
        assert_eq!((frame.width(), frame.height()), (1, 2));
        assert_eq!(frame.image.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(frame.image.get_pixel(0, 1).0, [40, 50, 60]);
    }

    #[test]
    fn test_malformed_frames_dropped() {
        let mut fb = FrameBuffer::new();
        fb.intake(&msg(1, 1, 3, PixelEncoding::Bgr8, vec![7, 8, 9])).unwrap();

        assert_eq!(
            fb.intake(&msg(0, 1, 3, PixelEncoding::Bgr8, vec![1, 2, 3])),
            Err(FrameError::EmptyImage { width: 0, height: 1 })
        );
        assert_eq!(
            fb.intake(&msg(2, 1, 3, PixelEncoding::Bgr8, vec![1, 2, 3])),
            Err(FrameError::StrideTooShort { step: 3, width: 2 })
        );
        assert_eq!(
            fb.intake(&msg(1, 2, 3, PixelEncoding::Rgb8, vec![1, 2, 3])),
            Err(FrameError::LengthMismatch { expected: Some(6), actual: 3 })
        );
        assert!(matches!(
            fb.intake(&msg(1, u32::MAX, u32::MAX, PixelEncoding::Rgb8, vec![])),
            Err(FrameError::LengthMismatch { .. })
        ));

        // Last valid content survives
        assert_eq!(fb.latest().unwrap().image.get_pixel(0, 0).0, [7, 8, 9]);
    }

    #[test]
    fn test_newest_frame_wins() {
        let mut fb = FrameBuffer::new();
        fb.intake(&msg(1, 1, 3, PixelEncoding::Bgr8, vec![1, 1, 1])).unwrap();
        fb.intake(&msg(2, 1, 6, PixelEncoding::Bgr8, vec![2; 6])).unwrap();

        assert_eq!(fb.latest().unwrap().width(), 2);
    }
}
