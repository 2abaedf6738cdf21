use imageproc::point::Point;

use super::moments::PolygonMoments;

/// Closed polygon summarizing the dominant edge structure of one crop.
///
/// Built from the hull of the largest contour followed by the hull of the
/// second largest. The two hulls are concatenated, not unioned, so the
/// polygon may cross itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeDescriptor {
    points: Vec<Point<i32>>,
}

impl ShapeDescriptor {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn merged(first: &[Point<i32>], second: &[Point<i32>]) -> Self {
        let mut points = Vec::with_capacity(first.len() + second.len());
        points.extend_from_slice(first);
        points.extend_from_slice(second);
        Self { points }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn hu_moments(&self) -> [f64; 7] {
        PolygonMoments::from_points(&self.points).hu()
    }
}
