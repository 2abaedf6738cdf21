use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;

use crate::shared::constants::{CROP_BLUR_KERNEL, CROP_SIZE};
use crate::shared::region::Region;

/// Fixed-size smoothed grayscale view of one selected region.
pub struct NormalizedCrop {
    image: GrayImage,
}

impl NormalizedCrop {
    /// Resizes `crop` to `CROP_SIZE` square and smooths it with a
    /// `CROP_BLUR_KERNEL` tap normalized Gaussian.
    pub fn from_image(crop: &GrayImage) -> Self {
        let resized = imageops::resize(crop, CROP_SIZE, CROP_SIZE, FilterType::Triangle);
        Self {
            image: smooth(&resized, &gaussian_kernel(CROP_BLUR_KERNEL)),
        }
    }

    /// Wraps an image that is already normalized.
    pub fn from_normalized(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

/// Copies `region` out of `gray`. `None` when the region is empty or
/// reaches outside the image.
pub fn crop_gray(gray: &GrayImage, region: &Region) -> Option<GrayImage> {
    if region.is_empty() || !region.fits_within(gray.width(), gray.height()) {
        return None;
    }
    Some(
        imageops::crop_imm(
            gray,
            region.x as u32,
            region.y as u32,
            region.width as u32,
            region.height as u32,
        )
        .to_image(),
    )
}

/// Separable convolution in floating point, rounded back to 8 bits.
fn smooth(image: &GrayImage, kernel: &[f32]) -> GrayImage {
    let samples: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            Luma([f32::from(image.get_pixel(x, y)[0])])
        });
    let blurred = separable_filter_equal(&samples, kernel);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([blurred.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

/// Fixed-size Gaussian weights summing to one, sigma from [`gaussian_sigma`].
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = f64::from(gaussian_sigma(size));
    let center = f64::from(size / 2);
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = f64::from(i) - center;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Standard deviation OpenCV derives for an odd kernel size when none is
/// given.
pub fn gaussian_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}
