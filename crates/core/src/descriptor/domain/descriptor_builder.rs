use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::contrast::otsu_level;
use imageproc::edges::canny;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use super::moments::polygon_area;
use super::normalized_crop::NormalizedCrop;
use super::shape_descriptor::ShapeDescriptor;
use crate::shared::constants::CANNY_LOW_RATIO;

/// Lower bound for the Canny high threshold. A zero Otsu level would
/// otherwise mark every flat pixel as an edge.
const MIN_EDGE_STRENGTH: f32 = 1.0;

/// Everything one descriptor build produced, kept for display.
pub struct DescriptorBuild {
    /// Otsu level of the crop, used as the Canny high threshold.
    pub threshold: u8,
    pub edges: GrayImage,
    pub contour_count: usize,
    /// Hulls of the two largest contours, largest first. Empty when fewer
    /// than two contours were found.
    pub hulls: Vec<Vec<Point<i32>>>,
    pub descriptor: Option<ShapeDescriptor>,
}

/// Turns a normalized crop into a shape descriptor: Otsu level, Canny
/// edges, border-following contours, then the convex hulls of the two
/// largest contours joined end to end.
pub struct DescriptorBuilder {
    canny_low_ratio: f32,
}

impl DescriptorBuilder {
    pub fn new(canny_low_ratio: f32) -> Self {
        Self { canny_low_ratio }
    }

    pub fn build(&self, crop: &NormalizedCrop) -> DescriptorBuild {
        let image = crop.image();
        let threshold = otsu_level(image);
        let high = f32::from(threshold).max(MIN_EDGE_STRENGTH);
        let edges = canny(image, high * self.canny_low_ratio, high);

        let contours: Vec<Vec<Point<i32>>> = find_contours::<i32>(&edges)
            .into_iter()
            .map(|c| c.points)
            .collect();
        let contour_count = contours.len();
        let (hulls, descriptor) = merge_largest(contours);

        if descriptor.is_none() {
            log::debug!("Descriptor skipped: {contour_count} contour(s) found");
        }
        DescriptorBuild {
            threshold,
            edges,
            contour_count,
            hulls,
            descriptor,
        }
    }
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new(CANNY_LOW_RATIO)
    }
}

/// Orders contours by enclosed area (ties keep their order) and joins the
/// hulls of the top two.
fn merge_largest(
    contours: Vec<Vec<Point<i32>>>,
) -> (Vec<Vec<Point<i32>>>, Option<ShapeDescriptor>) {
    if contours.len() < 2 {
        return (Vec::new(), None);
    }

    let mut by_area: Vec<(f64, Vec<Point<i32>>)> = contours
        .into_iter()
        .map(|c| (polygon_area(&c).abs(), c))
        .collect();
    by_area.sort_by(|a, b| b.0.total_cmp(&a.0));

    let hulls: Vec<Vec<Point<i32>>> = by_area
        .iter()
        .take(2)
        .map(|(_, c)| convex_hull(c.as_slice()))
        .collect();
    let merged = ShapeDescriptor::merged(&hulls[0], &hulls[1]);
    let descriptor = (!merged.is_empty()).then_some(merged);
    (hulls, descriptor)
}
