use crate::{CompareError, Result};
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;

/// Single-channel intensity view of any input raster.
pub fn to_luminance(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Bring any channel layout (gray, gray+alpha, RGB, RGBA, 16-bit) to RGB8 so
/// two rasters of different depth can be blended.
pub fn normalize_channels(image: &DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        other => other.to_rgb8(),
    }
}

/// Load an image from disk without changing its channel layout
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path)?;
    validate_image_size(&img)?;
    Ok(img)
}

/// Write an image, format chosen from the file extension
pub fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path)?;
    Ok(())
}

/// Validate that image has reasonable dimensions
pub fn validate_image_size(image: &DynamicImage) -> Result<()> {
    validate_image_size_with_limits(image, 1, 30_000)
}

/// Validate image size with custom limits
pub fn validate_image_size_with_limits(image: &DynamicImage, min_size: u32, max_size: u32) -> Result<()> {
    let (width, height) = (image.width(), image.height());

    if width < min_size || height < min_size {
        return Err(CompareError::Config(format!(
            "Image too small: {}x{}, minimum: {}x{}",
            width, height, min_size, min_size
        )));
    }

    if width > max_size || height > max_size {
        return Err(CompareError::Config(format!(
            "Image too large: {}x{}, maximum: {}x{}",
            width, height, max_size, max_size
        )));
    }

    Ok(())
}
