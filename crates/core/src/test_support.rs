use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_ellipse_mut};

use crate::shared::constants::CROP_SIZE;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Side of the frames built by [`ring_frame`].
pub(crate) const RING_FRAME_SIZE: u32 = 300;

/// Crop-sized image with a bright annulus around `center`: two concentric
/// circular edges once run through Canny.
pub(crate) fn ring_image(center: (i32, i32)) -> GrayImage {
    ring_on_canvas(CROP_SIZE, center, 20, 200)
}

/// RGB frame with a dark annulus centred on a bright background, for
/// end-to-end pipeline tests. The annulus stays a minority of the pixels so
/// histogram equalization keeps the two levels far apart.
pub(crate) fn ring_frame(index: usize) -> Frame {
    let half = (RING_FRAME_SIZE / 2) as i32;
    let gray = ring_on_canvas(RING_FRAME_SIZE, (half, half), 200, 20);
    Frame::from_rgb_image(DynamicImage::ImageLuma8(gray).to_rgb8(), index)
}

/// Like [`ring_frame`], but the annulus is elliptical with outer radii
/// `outer` and inner radii half of those, centred at `center`.
pub(crate) fn ellipse_ring_frame(index: usize, center: (i32, i32), outer: (i32, i32)) -> Frame {
    let mut gray = GrayImage::from_pixel(RING_FRAME_SIZE, RING_FRAME_SIZE, Luma([200]));
    draw_filled_ellipse_mut(&mut gray, center, outer.0, outer.1, Luma([20]));
    draw_filled_ellipse_mut(&mut gray, center, outer.0 / 2, outer.1 / 2, Luma([200]));
    Frame::from_rgb_image(DynamicImage::ImageLuma8(gray).to_rgb8(), index)
}

/// Region a detector would report around the annulus of [`ring_frame`].
pub(crate) fn ring_region() -> Region {
    Region::new(75, 75, 150, 150)
}

/// Featureless frame of the same size as [`ring_frame`].
pub(crate) fn blank_frame(index: usize) -> Frame {
    let gray = GrayImage::from_pixel(RING_FRAME_SIZE, RING_FRAME_SIZE, Luma([90]));
    Frame::from_rgb_image(DynamicImage::ImageLuma8(gray).to_rgb8(), index)
}

fn ring_on_canvas(size: u32, center: (i32, i32), background: u8, ring: u8) -> GrayImage {
    let mut img = GrayImage::from_pixel(size, size, Luma([background]));
    draw_filled_circle_mut(&mut img, center, 70, Luma([ring]));
    draw_filled_circle_mut(&mut img, center, 35, Luma([background]));
    img
}
