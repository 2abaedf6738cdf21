use image::GrayImage;
use imageproc::integral_image::{integral_image, integral_squared_image};

/// Summed-area tables of one grayscale frame, shared by every scan window.
pub struct IntegralImages {
    stride: usize,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
    tilted: Option<TiltedIntegral>,
}

impl IntegralImages {
    pub fn new(gray: &GrayImage, with_tilted: bool) -> Self {
        let sum = integral_image::<_, u64>(gray);
        let sq_sum = integral_squared_image::<_, u64>(gray);
        Self {
            stride: sum.width() as usize,
            sum: sum.into_raw(),
            sq_sum: sq_sum.into_raw(),
            tilted: with_tilted.then(|| TiltedIntegral::new(gray)),
        }
    }

    /// Sum of pixels in `[x, x + w) x [y, y + h)`. The rectangle must lie
    /// inside the image.
    pub fn rect_sum(&self, x: i32, y: i32, w: i32, h: i32) -> f64 {
        Self::lookup(&self.sum, self.stride, x, y, w, h) as f64
    }

    pub fn rect_sq_sum(&self, x: i32, y: i32, w: i32, h: i32) -> f64 {
        Self::lookup(&self.sq_sum, self.stride, x, y, w, h) as f64
    }

    /// Sum over a 45 degree rotated rectangle whose top corner is `(x, y)`,
    /// extending `w` pixels down-right and `h` pixels down-left.
    ///
    /// Returns zero when the tables were built without tilted support.
    pub fn tilted_sum(&self, x: i32, y: i32, w: i32, h: i32) -> f64 {
        match &self.tilted {
            Some(t) => t.rect_sum(x, y, w, h) as f64,
            None => 0.0,
        }
    }

    fn lookup(table: &[u64], stride: usize, x: i32, y: i32, w: i32, h: i32) -> u64 {
        let at = |cx: i32, cy: i32| table[cy as usize * stride + cx as usize];
        let (x1, y1) = (x + w, y + h);
        // a + d - b - c, reordered so the unsigned sum never dips below zero
        (at(x1, y1) + at(x, y)) - (at(x1, y) + at(x, y1))
    }
}

/// Rotated summed-area table.
///
/// `T(X, Y)` holds the sum of `I(x, y)` over `y < Y` and
/// `|x - X + 1| <= Y - y - 1`: an upward-opening triangle with its apex at
/// `(X - 1, Y - 1)`. Columns are padded by `height + 1` on both sides so the
/// recurrence never reads a triangle that still overlaps the image.
struct TiltedIntegral {
    values: Vec<i64>,
    pad: i32,
    cols: i32,
    rows: i32,
}

impl TiltedIntegral {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = (gray.width() as i32, gray.height() as i32);
        let pad = height + 1;
        let cols = width + 1 + 2 * pad;
        let rows = height + 1;
        let mut t = Self {
            values: vec![0; (cols * rows) as usize],
            pad,
            cols,
            rows,
        };

        let pixel = |x: i32, y: i32| -> i64 {
            if x < 0 || y < 0 || x >= width || y >= height {
                0
            } else {
                gray.get_pixel(x as u32, y as u32)[0] as i64
            }
        };

        for y in 1..rows {
            for x in -pad..=width + pad {
                let v = t.get(x - 1, y - 1) + t.get(x + 1, y - 1) - t.get(x, y - 2)
                    + pixel(x - 1, y - 1)
                    + pixel(x - 1, y - 2);
                t.set(x, y, v);
            }
        }
        t
    }

    fn get(&self, x: i32, y: i32) -> i64 {
        let col = x + self.pad;
        if y < 0 || y >= self.rows || col < 0 || col >= self.cols {
            return 0;
        }
        self.values[(y * self.cols + col) as usize]
    }

    fn set(&mut self, x: i32, y: i32, v: i64) {
        let col = x + self.pad;
        self.values[(y * self.cols + col) as usize] = v;
    }

    fn rect_sum(&self, x: i32, y: i32, w: i32, h: i32) -> i64 {
        self.get(x, y) - self.get(x - h, y + h) - self.get(x + w, y + w)
            + self.get(x + w - h, y + w + h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn pattern(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 37 + y * 91 + x * y) % 251) as u8]))
    }

    fn brute_tilted(gray: &GrayImage, big_x: i32, big_y: i32) -> i64 {
        let mut total = 0;
        for y in 0..big_y.min(gray.height() as i32) {
            for x in 0..gray.width() as i32 {
                if (x - big_x + 1).abs() <= big_y - y - 1 {
                    total += gray.get_pixel(x as u32, y as u32)[0] as i64;
                }
            }
        }
        total
    }

    #[test]
    fn test_rect_sum_matches_brute_force() {
        let gray = pattern(13, 9);
        let tables = IntegralImages::new(&gray, false);
        let (x, y, w, h) = (3, 2, 6, 5);
        let mut expected = 0.0;
        let mut expected_sq = 0.0;
        for yy in y..y + h {
            for xx in x..x + w {
                let v = gray.get_pixel(xx as u32, yy as u32)[0] as f64;
                expected += v;
                expected_sq += v * v;
            }
        }
        assert_relative_eq!(tables.rect_sum(x, y, w, h), expected);
        assert_relative_eq!(tables.rect_sq_sum(x, y, w, h), expected_sq);
    }

    #[test]
    fn test_full_image_sum() {
        let gray = GrayImage::from_pixel(8, 6, Luma([3]));
        let tables = IntegralImages::new(&gray, false);
        assert_relative_eq!(tables.rect_sum(0, 0, 8, 6), 144.0);
    }

    #[test]
    fn test_tilted_table_matches_definition() {
        let gray = pattern(11, 7);
        let tilted = TiltedIntegral::new(&gray);
        for big_y in 0..=7 {
            for big_x in 0..=11 {
                assert_eq!(
                    tilted.get(big_x, big_y),
                    brute_tilted(&gray, big_x, big_y),
                    "T({big_x}, {big_y})"
                );
            }
        }
    }

    #[test]
    fn test_tilted_rect_on_ones_covers_twice_the_area() {
        let gray = GrayImage::from_pixel(20, 20, Luma([1]));
        let tables = IntegralImages::new(&gray, true);
        assert_relative_eq!(tables.tilted_sum(10, 2, 3, 2), 12.0);
        assert_relative_eq!(tables.tilted_sum(10, 2, 1, 1), 2.0);
    }

    #[test]
    fn test_tilted_sum_without_table_is_zero() {
        let gray = GrayImage::from_pixel(20, 20, Luma([1]));
        let tables = IntegralImages::new(&gray, false);
        assert_relative_eq!(tables.tilted_sum(10, 2, 3, 2), 0.0);
    }
}
