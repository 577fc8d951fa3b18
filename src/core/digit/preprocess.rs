use crate::core::digit::network::INPUT_SIZE;
use crate::utils::error::{EchoError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageReader, Limits, Luma};
use std::fmt::Display;
use std::io::Cursor;

/// MNIST training-set mean and standard deviation.
pub const MNIST_MEAN: f32 = 0.1307;
pub const MNIST_STD: f32 = 0.3081;

/// Largest accepted input side; digit images are tiny.
pub const MAX_IMAGE_SIDE: u32 = 4096;
const MAX_DECODE_ALLOC: u64 = 64 * 1024 * 1024;

/// Decodes an encoded image into the network's input plane: grayscale,
/// 28x28 bilinear resize, scaled to [0, 1], then normalised.
pub fn preprocess_image(image_bytes: &[u8]) -> Result<Vec<f32>> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_SIDE);
    limits.max_image_height = Some(MAX_IMAGE_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(|e| preprocessing_failed(&e))?;
    reader.limits(limits);
    let decoded = reader.decode().map_err(|e| preprocessing_failed(&e))?;

    let gray = to_luma_601(&decoded);
    let resized = image::imageops::resize(
        &gray,
        INPUT_SIZE as u32,
        INPUT_SIZE as u32,
        FilterType::Triangle,
    );

    Ok(resized
        .pixels()
        .map(|p| (f32::from(p.0[0]) / 255.0 - MNIST_MEAN) / MNIST_STD)
        .collect())
}

/// ITU-R 601-2 luma (`L = R*299/1000 + G*587/1000 + B*114/1000`), the
/// conversion the digit models were trained with. Alpha is ignored.
fn to_luma_601(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
        Luma([(l >> 16) as u8])
    })
}

fn preprocessing_failed(err: &dyn Display) -> EchoError {
    EchoError::PreprocessingError {
        message: format!("Image preprocessing failed: {}", err),
    }
}
