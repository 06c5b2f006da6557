//! # Camera Equipment Communications Module
//!
//! Raw frames arrive from the camera as [`ImageMsg`]s. Annotated debug frames leave the exec as
//! compressed [`CamFrame`]s wrapped in a [`DebugFrame`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc, serde::ts_milliseconds};
use image::{DynamicImage, ImageResult};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Topic on which annotated debug frames are published.
pub const DEBUG_TOPIC: &str = "/lks/debug";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An uncompressed image published by the camera.
///
/// Rows are `step` bytes long, of which the first `width * 3` hold pixels. Nothing about the
/// declared sizes is trusted, receivers must check them against `data` before use.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageMsg {
    /// Width of the image in pixels
    pub width: u32,

    /// Height of the image in pixels
    pub height: u32,

    /// Length of one row in bytes
    pub step: u32,

    /// Order of the colour channels in `data`
    pub encoding: PixelEncoding,

    /// Pixel data, base64 encoded on the wire
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>
}

/// An individual compressed frame
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CamFrame {

    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// The format of this frame
    pub format: ImageFormat,

    /// The formatted image data
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>
}

/// A decoded image along with its acquisition time
#[derive(Clone)]
pub struct CamImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: DynamicImage
}

/// A frame annotated with the lane estimate, published when debugging is enabled.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DebugFrame {
    /// Detected left lane edge in pixels
    pub left_x: f64,

    /// Detected right lane edge in pixels
    pub right_x: f64,

    /// Smoothed midpoint estimate in pixels
    pub estimated_x: f64,

    /// The annotated image
    pub frame: CamFrame
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Channel order of the pixels in an [`ImageMsg`]. Both use 8 bits per channel.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PixelEncoding {
    Rgb8,
    Bgr8
}

/// Possible formats for compressed images. This is used rather than image::ImageFormat to:
///     1. Restrict the formats that can be sent back and forth
///     2. Allow serialisation as image::ImageFormat does not implement serde.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG image
    Png,

    /// JPEG image with a quality value between 1 and 100, where 100 is best.
    Jpeg(u8)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PixelEncoding {
    /// Number of bytes used by one pixel.
    pub fn bytes_per_pixel(&self) -> u32 {
        3
    }
}

impl CamFrame {
    /// Convert this camera frame into a camera image
    pub fn to_cam_image(&self) -> ImageResult<CamImage>  {
        // Convert the data
        let image = match self.format {
            ImageFormat::Png => 
                image::load_from_memory_with_format(
                    &self.data, 
                    image::ImageFormat::Png
                )?,
            ImageFormat::Jpeg(_) =>
                image::load_from_memory_with_format(
                    &self.data, 
                    image::ImageFormat::Jpeg
                )?
        };

        Ok(CamImage {
            timestamp: self.timestamp,
            image
        })
    }
}

impl CamImage {
    /// Convert this camera image into a camera frame with the given format
    pub fn to_cam_frame(&self, format: ImageFormat) -> ImageResult<CamFrame> {
        // Write data to the buffer
        let mut data = Vec::<u8>::new();

        // Get the output format type
        let output_format = match format {
            ImageFormat::Png => image::ImageOutputFormat::Png,
            ImageFormat::Jpeg(q)  => image::ImageOutputFormat::Jpeg(q)
        };

        self.image.write_to(&mut data, output_format)?;

        // Return the frame
        Ok(CamFrame {
            timestamp: self.timestamp,
            format,
            data
        })
    }
}

// ------------------------------------------------------------------------------------------------
// SERDE HELPERS
// ------------------------------------------------------------------------------------------------

/// Serialise byte vectors as base64 strings, JSON arrays of numbers being far too large for
/// image data.
mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>
    {
        let s = String::deserialize(deserializer)?;
        base64::decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_image_msg_wire_format() {
        let msg = ImageMsg {
            width: 1,
            height: 1,
            step: 3,
            encoding: PixelEncoding::Rgb8,
            data: vec![255, 0, 0]
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"width":1,"height":1,"step":3,"encoding":"rgb8","data":"/wAA"}"#
        );

        let back: ImageMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_bad_base64_rejected() {
        let json = r#"{"width":1,"height":1,"step":3,"encoding":"bgr8","data":"***"}"#;
        assert!(serde_json::from_str::<ImageMsg>(json).is_err());
    }

    #[test]
    fn test_png_frame_decodes() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4, 2, image::Rgb([10, 20, 30])
        ));
        let cam_image = CamImage { timestamp: Utc::now(), image };

        let frame = cam_image.to_cam_frame(ImageFormat::Png).unwrap();
        let decoded = frame.to_cam_image().unwrap().image.to_rgb8();

        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(3, 1), &image::Rgb([10, 20, 30]));
    }
}
