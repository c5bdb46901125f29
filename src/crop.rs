use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder};

use crate::models::FaceRectangle;

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error(
        "face rectangle {rect:?} does not fit inside the {image_width}x{image_height} image"
    )]
    OutOfBounds {
        rect: FaceRectangle,
        image_width: u32,
        image_height: u32,
    },
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Cuts a face rectangle out of an encoded image and re-encodes it as JPEG.
pub trait ImageCropper: Send + Sync {
    fn crop_to_jpeg(&self, bytes: &[u8], rect: FaceRectangle) -> Result<Vec<u8>, CropError>;
}

pub struct JpegCropper {
    quality: u8,
}

impl JpegCropper {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl ImageCropper for JpegCropper {
    fn crop_to_jpeg(&self, bytes: &[u8], rect: FaceRectangle) -> Result<Vec<u8>, CropError> {
        let image = decode_image(bytes)?;
        check_bounds(rect, image.width(), image.height())?;

        let cropped = image.crop_imm(rect.left, rect.top, rect.width, rect.height);
        encode_jpeg(&cropped, self.quality)
    }
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, CropError> {
    image::load_from_memory(bytes).map_err(|e| CropError::Decode(e.to_string()))
}

/// `crop_imm` silently clamps, so an inconsistent rectangle has to be caught here.
fn check_bounds(rect: FaceRectangle, image_width: u32, image_height: u32) -> Result<(), CropError> {
    let fits = |start: u32, len: u32, limit: u32| {
        len > 0 && start.checked_add(len).is_some_and(|end| end <= limit)
    };
    if fits(rect.left, rect.width, image_width) && fits(rect.top, rect.height, image_height) {
        Ok(())
    } else {
        Err(CropError::OutOfBounds {
            rect,
            image_width,
            image_height,
        })
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CropError> {
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CropError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}
