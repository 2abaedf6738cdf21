use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_ellipse_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::descriptor::domain::shape_descriptor::ShapeDescriptor;
use crate::shared::region::Region;

const DETECTION_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const DETECTION_THICKNESS: i32 = 4;
const HULL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const REFERENCE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Outlines the selected ear with an ellipse inscribed in `region`.
pub fn draw_detection(image: &mut RgbImage, region: &Region) {
    let center = (region.x + region.width / 2, region.y + region.height / 2);
    let (rx, ry) = (region.width / 2, region.height / 2);
    let half = DETECTION_THICKNESS / 2;
    for offset in -half..DETECTION_THICKNESS - half {
        let (wx, wy) = (rx + offset, ry + offset);
        if wx > 0 && wy > 0 {
            draw_hollow_ellipse_mut(image, center, wx, wy, DETECTION_COLOR);
        }
    }
}

/// Black canvas with `descriptor` filled green and, when given, the
/// reference outlined in red.
pub fn render_contours(
    descriptor: &ShapeDescriptor,
    reference: Option<&ShapeDescriptor>,
    size: (u32, u32),
) -> RgbImage {
    let mut canvas = RgbImage::new(size.0, size.1);
    fill_polygon(&mut canvas, descriptor.points(), HULL_COLOR);
    if let Some(reference) = reference {
        draw_closed_polyline(&mut canvas, reference.points(), REFERENCE_COLOR);
    }
    canvas
}

fn fill_polygon(canvas: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    // the fill routine rejects a polygon whose last point repeats the first
    let mut end = points.len();
    while end > 1 && points[end - 1] == points[0] {
        end -= 1;
    }
    let points = &points[..end];
    if points.len() >= 3 {
        draw_polygon_mut(canvas, points, color);
    } else {
        draw_closed_polyline(canvas, points, color);
    }
}

fn draw_closed_polyline(canvas: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    let Some(last) = points.last() else {
        return;
    };
    let mut prev = last;
    for p in points {
        draw_line_segment_mut(
            canvas,
            (prev.x as f32, prev.y as f32),
            (p.x as f32, p.y as f32),
            color,
        );
        prev = p;
    }
}
