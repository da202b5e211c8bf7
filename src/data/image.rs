use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;
use log::warn;

use crate::error::{read_file, Result};
use crate::math::{Shape, Tensor};

/// Decodes an image (PPM, PNG, JPEG, BMP or GIF) into a `width × height × 1`
/// grayscale tensor.
///
/// Each value is the mean of the R, G and B channels divided by 255. Images
/// of any other size are resized first.
pub fn image_bytes_to_tensor(bytes: &[u8], width: u32, height: u32) -> Result<Tensor> {
    let img = image::load_from_memory(bytes)?;
    let rgb = if img.width() != width || img.height() != height {
        warn!(
            "sample is {}×{}, resizing to {}×{}",
            img.width(),
            img.height(),
            width,
            height
        );
        img.resize_exact(width, height, FilterType::Lanczos3).to_rgb8()
    } else {
        img.to_rgb8()
    };
    Ok(rgb_to_tensor(&rgb))
}

/// Reads and decodes the sample image at `path`.
pub fn load_sample(path: &Path, width: u32, height: u32) -> Result<Tensor> {
    let bytes = read_file(path)?;
    image_bytes_to_tensor(&bytes, width, height)
}

fn rgb_to_tensor(rgb: &RgbImage) -> Tensor {
    let shape = Shape::new(rgb.width() as usize, rgb.height() as usize, 1);
    let mut tensor = Tensor::zeros(shape);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let gray = (r as f32 + g as f32 + b as f32) / (3.0 * 255.0);
        tensor.set(x as usize, y as usize, 0, gray);
    }
    tensor
}
