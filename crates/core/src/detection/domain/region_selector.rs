use crate::shared::constants::ENLARGE_FACTOR;
use crate::shared::region::Region;

/// Picks the ear to describe and pads it so no edge detail is clipped.
pub struct RegionSelector {
    enlarge_factor: f64,
}

impl RegionSelector {
    pub fn new(enlarge_factor: f64) -> Self {
        Self { enlarge_factor }
    }

    /// Region with the largest area; on ties the first one wins.
    pub fn select_largest(&self, regions: &[Region]) -> Option<Region> {
        let mut largest: Option<Region> = None;
        for r in regions {
            match largest {
                Some(current) if r.area() <= current.area() => {}
                _ => largest = Some(*r),
            }
        }
        largest
    }

    /// Grows `region` by `enlarge_factor` of its size around the same
    /// center, then clamps it to the frame.
    ///
    /// The increase is truncated to whole pixels and the origin moves by
    /// half of it. Clamping keeps the grown size when the origin is pushed
    /// back to zero and only trims at the right and bottom edges.
    pub fn enlarge(&self, region: &Region, frame_width: u32, frame_height: u32) -> Region {
        let frame_w = frame_width as i32;
        let frame_h = frame_height as i32;

        let width_increase = (self.enlarge_factor * region.width as f64) as i32;
        let height_increase = (self.enlarge_factor * region.height as f64) as i32;

        let mut x = region.x - width_increase / 2;
        let mut y = region.y - height_increase / 2;
        let mut width = region.width + width_increase;
        let mut height = region.height + height_increase;

        x = x.clamp(0, frame_w);
        y = y.clamp(0, frame_h);
        if x + width > frame_w {
            width = frame_w - x;
        }
        if y + height > frame_h {
            height = frame_h - y;
        }

        Region::new(x, y, width.max(0), height.max(0))
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new(ENLARGE_FACTOR)
    }
}
