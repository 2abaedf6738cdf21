use imageproc::point::Point;

/// Spatial moments of a closed polygon up to third order, from Green's
/// theorem over its edges.
///
/// The polygon is closed implicitly (last point back to the first) and the
/// result does not depend on the winding direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PolygonMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl PolygonMoments {
    pub fn from_points(points: &[Point<i32>]) -> Self {
        let Some(last) = points.last() else {
            return Self::default();
        };

        let mut a = [0.0f64; 10];
        let (mut xp, mut yp) = (last.x as f64, last.y as f64);
        for p in points {
            let (x, y) = (p.x as f64, p.y as f64);
            let cross = xp * y - x * yp;
            let xs = xp + x;
            let ys = yp + y;

            a[0] += cross;
            a[1] += cross * xs;
            a[2] += cross * ys;
            a[3] += cross * (xp * xs + x * x);
            a[4] += cross * (xp * (ys + yp) + x * (ys + y));
            a[5] += cross * (yp * ys + y * y);
            a[6] += cross * xs * (xp * xp + x * x);
            a[7] += cross * (xp * xp * (3.0 * yp + y) + 2.0 * x * xp * ys + x * x * (yp + 3.0 * y));
            a[8] += cross * (yp * yp * (3.0 * xp + x) + 2.0 * y * yp * xs + y * y * (xp + 3.0 * x));
            a[9] += cross * ys * (yp * yp + y * y);

            xp = x;
            yp = y;
        }

        if a[0].abs() <= f64::from(f32::EPSILON) {
            return Self::default();
        }
        let sign = a[0].signum();
        Self {
            m00: sign * a[0] / 2.0,
            m10: sign * a[1] / 6.0,
            m01: sign * a[2] / 6.0,
            m20: sign * a[3] / 12.0,
            m11: sign * a[4] / 24.0,
            m02: sign * a[5] / 12.0,
            m30: sign * a[6] / 20.0,
            m21: sign * a[7] / 60.0,
            m12: sign * a[8] / 60.0,
            m03: sign * a[9] / 20.0,
        }
    }

    /// The seven Hu invariants; all zero for a polygon without area.
    pub fn hu(&self) -> [f64; 7] {
        if self.m00 == 0.0 {
            return [0.0; 7];
        }

        let cx = self.m10 / self.m00;
        let cy = self.m01 / self.m00;
        let mu20 = self.m20 - self.m10 * cx;
        let mu11 = self.m11 - self.m10 * cy;
        let mu02 = self.m02 - self.m01 * cy;
        let mu30 = self.m30 - cx * (3.0 * mu20 + cx * self.m10);
        let mu21 = self.m21 - cx * (2.0 * mu11 + cx * self.m01) - cy * mu20;
        let mu12 = self.m12 - cy * (2.0 * mu11 + cy * self.m10) - cx * mu02;
        let mu03 = self.m03 - cy * (3.0 * mu02 + cy * self.m01);

        let s2 = 1.0 / (self.m00 * self.m00);
        let s3 = s2 / self.m00.abs().sqrt();
        let (n20, n11, n02) = (mu20 * s2, mu11 * s2, mu02 * s2);
        let (n30, n21, n12, n03) = (mu30 * s3, mu21 * s3, mu12 * s3, mu03 * s3);

        let t0 = n30 + n12;
        let t1 = n21 + n03;
        let q0 = n20 - n02;
        let q1 = n30 - 3.0 * n12;
        let q2 = 3.0 * n21 - n03;

        [
            n20 + n02,
            q0 * q0 + 4.0 * n11 * n11,
            q1 * q1 + q2 * q2,
            t0 * t0 + t1 * t1,
            q1 * t0 * (t0 * t0 - 3.0 * t1 * t1) + q2 * t1 * (3.0 * t0 * t0 - t1 * t1),
            q0 * (t0 * t0 - t1 * t1) + 4.0 * n11 * t0 * t1,
            q2 * t0 * (t0 * t0 - 3.0 * t1 * t1) - q1 * t1 * (3.0 * t0 * t0 - t1 * t1),
        ]
    }
}

/// Signed shoelace area; positive for counter-clockwise points in a y-up
/// frame.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let Some(last) = points.last() else {
        return 0.0;
    };
    let mut prev = last;
    let mut twice = 0.0;
    for p in points {
        twice += prev.x as f64 * p.y as f64 - p.x as f64 * prev.y as f64;
        prev = p;
    }
    twice / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn square(x: i32, y: i32, side: i32) -> Vec<Point<i32>> {
        pts(&[(x, y), (x + side, y), (x + side, y + side), (x, y + side)])
    }

    #[test]
    fn test_square_moments() {
        let m = PolygonMoments::from_points(&square(0, 0, 10));
        assert_relative_eq!(m.m00, 100.0);
        assert_relative_eq!(m.m10, 500.0);
        assert_relative_eq!(m.m01, 500.0);
        assert_relative_eq!(m.m20, 1000.0 * 10.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.m11, 2500.0);
    }

    #[test]
    fn test_winding_does_not_matter() {
        let mut reversed = square(3, 4, 7);
        reversed.reverse();
        let a = PolygonMoments::from_points(&square(3, 4, 7));
        let b = PolygonMoments::from_points(&reversed);
        assert_relative_eq!(a.m00, b.m00);
        assert_relative_eq!(a.m21, b.m21, epsilon = 1e-9);
        assert!(a.m00 > 0.0);
    }

    #[test]
    fn test_square_hu_first_invariant() {
        let hu = PolygonMoments::from_points(&square(0, 0, 10)).hu();
        // (mu20 + mu02) / m00^2 = 2 * (side^4 / 12) / side^4
        assert_relative_eq!(hu[0], 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(hu[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hu_invariant_under_translation_and_scale() {
        let shape = pts(&[(0, 0), (12, 1), (15, 9), (6, 14), (-2, 7)]);
        let moved: Vec<Point<i32>> = shape
            .iter()
            .map(|p| Point::new(p.x * 3 + 40, p.y * 3 - 25))
            .collect();
        let a = PolygonMoments::from_points(&shape).hu();
        let b = PolygonMoments::from_points(&moved).hu();
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_polygons_have_zero_moments() {
        assert_eq!(PolygonMoments::from_points(&[]), PolygonMoments::default());
        let line = pts(&[(0, 0), (5, 5), (10, 10)]);
        assert_eq!(PolygonMoments::from_points(&line).hu(), [0.0; 7]);
    }

    #[test]
    fn test_polygon_area_sign() {
        let ccw = square(0, 0, 4);
        let mut cw = ccw.clone();
        cw.reverse();
        assert_relative_eq!(polygon_area(&ccw), 16.0);
        assert_relative_eq!(polygon_area(&cw), -16.0);
        assert_relative_eq!(polygon_area(&[]), 0.0);
    }
}
