use image::GrayImage;

use crate::shared::region::Region;

/// Domain interface for ear detection.
///
/// Receives the equalized grayscale frame and returns every candidate
/// region; picking one of them is the selector's job. Implementations may
/// keep scratch buffers between calls, hence `&mut self`.
pub trait RegionDetector: Send {
    fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
