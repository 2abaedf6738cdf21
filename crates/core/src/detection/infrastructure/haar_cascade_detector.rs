use std::path::Path;

use image::GrayImage;

use super::haar_cascade::{CascadeError, HaarCascade, NodeChild, WeightedRect};
use super::integral::IntegralImages;
use super::rect_grouping::{group_rectangles, GROUP_EPS};
use crate::detection::domain::region_detector::RegionDetector;
use crate::shared::constants::{
    DETECTION_MIN_NEIGHBORS, DETECTION_MIN_SIZE, DETECTION_SCALE_FACTOR,
};
use crate::shared::region::Region;

/// Multi-scale scan parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: usize,
    pub min_size: (u32, u32),
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: DETECTION_SCALE_FACTOR,
            min_neighbors: DETECTION_MIN_NEIGHBORS,
            min_size: DETECTION_MIN_SIZE,
        }
    }
}

/// Sliding-window detector evaluating a Haar cascade on integral images.
pub struct HaarCascadeDetector {
    cascade: HaarCascade,
    params: DetectionParams,
}

impl HaarCascadeDetector {
    pub fn new(cascade: HaarCascade, params: DetectionParams) -> Result<Self, &'static str> {
        if params.scale_factor <= 1.0 {
            return Err("scale_factor must be > 1");
        }
        Ok(Self { cascade, params })
    }

    /// Loads the cascade at `path` with default parameters.
    pub fn from_file(path: &Path) -> Result<Self, CascadeError> {
        let cascade = HaarCascade::load(path)?;
        log::info!(
            "Loaded cascade {} ({}x{} window, {} stages, {} features)",
            path.display(),
            cascade.window_width,
            cascade.window_height,
            cascade.stages.len(),
            cascade.features.len()
        );
        Ok(Self {
            cascade,
            params: DetectionParams::default(),
        })
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    fn scan(&self, gray: &GrayImage) -> Vec<Region> {
        let (img_w, img_h) = (gray.width() as i32, gray.height() as i32);
        let tables = IntegralImages::new(gray, self.cascade.has_tilted_features());
        let (base_w, base_h) = (
            self.cascade.window_width as f64,
            self.cascade.window_height as f64,
        );
        let (min_w, min_h) = (self.params.min_size.0 as i32, self.params.min_size.1 as i32);

        let mut hits = Vec::new();
        let mut factor = 1.0;
        loop {
            let win_w = (base_w * factor).round() as i32;
            let win_h = (base_h * factor).round() as i32;
            if win_w > img_w || win_h > img_h {
                break;
            }
            if win_w >= min_w && win_h >= min_h {
                let scaled = ScaledCascade::new(&self.cascade, factor, (win_w, win_h));
                let step = if factor > 2.0 { factor } else { 2.0 * factor };
                let step = (step.round() as i32).max(1);
                let mut y = 0;
                while y + win_h <= img_h {
                    let mut x = 0;
                    while x + win_w <= img_w {
                        if scaled.accepts(&tables, &self.cascade, x, y) {
                            hits.push(Region::new(x, y, win_w, win_h));
                        }
                        x += step;
                    }
                    y += step;
                }
            }
            factor *= self.params.scale_factor;
        }
        hits
    }
}

impl RegionDetector for HaarCascadeDetector {
    fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let hits = self.scan(frame);
        let grouped = group_rectangles(&hits, self.params.min_neighbors, GROUP_EPS);
        log::debug!("Cascade: {} raw hits, {} grouped", hits.len(), grouped.len());
        Ok(grouped)
    }
}

/// Features resized for one scale, with weights pre-divided by the
/// normalization area.
struct ScaledCascade {
    features: Vec<ScaledFeature>,
    norm: (i32, i32, i32, i32),
    inv_area: f64,
}

struct ScaledFeature {
    rects: Vec<WeightedRect>,
    tilted: bool,
}

impl ScaledCascade {
    fn new(cascade: &HaarCascade, factor: f64, window: (i32, i32)) -> Self {
        let inset = factor.round() as i32;
        let norm_w = ((cascade.window_width as f64 - 2.0) * factor).round() as i32;
        let norm_h = ((cascade.window_height as f64 - 2.0) * factor).round() as i32;
        let inv_area = 1.0 / (norm_w.max(1) as f64 * norm_h.max(1) as f64);

        let features = cascade
            .features
            .iter()
            .map(|f| {
                let mut rects: Vec<WeightedRect> = f
                    .rects
                    .iter()
                    .map(|r| {
                        let x = (r.x as f64 * factor).round() as i32;
                        let y = (r.y as f64 * factor).round() as i32;
                        let mut width = (r.width as f64 * factor).round() as i32;
                        let mut height = (r.height as f64 * factor).round() as i32;
                        if !f.tilted {
                            width = width.min(window.0 - x);
                            height = height.min(window.1 - y);
                        }
                        WeightedRect {
                            x,
                            y,
                            width,
                            height,
                            weight: r.weight * inv_area,
                        }
                    })
                    .collect();
                // rounding changes areas; rebalance rect 0 so the feature
                // still sums to zero over a flat window
                let area0 = (rects[0].width * rects[0].height) as f64;
                if area0 > 0.0 {
                    let rest: f64 = rects[1..]
                        .iter()
                        .map(|r| r.weight * (r.width * r.height) as f64)
                        .sum();
                    rects[0].weight = -rest / area0;
                }
                ScaledFeature {
                    rects,
                    tilted: f.tilted,
                }
            })
            .collect();

        Self {
            features,
            norm: (inset, inset, norm_w, norm_h),
            inv_area,
        }
    }

    fn accepts(&self, tables: &IntegralImages, cascade: &HaarCascade, x: i32, y: i32) -> bool {
        let (nx, ny, nw, nh) = self.norm;
        let mean = tables.rect_sum(x + nx, y + ny, nw, nh) * self.inv_area;
        let variance = tables.rect_sq_sum(x + nx, y + ny, nw, nh) * self.inv_area - mean * mean;
        let std_dev = if variance > 0.0 { variance.sqrt() } else { 1.0 };

        cascade.stages.iter().all(|stage| {
            let total: f64 = stage
                .trees
                .iter()
                .map(|tree| {
                    let mut index = 0;
                    loop {
                        let node = &tree[index];
                        let value = self.feature_value(tables, node.feature, x, y);
                        let next = if value < node.threshold * std_dev {
                            node.left
                        } else {
                            node.right
                        };
                        match next {
                            NodeChild::Node(i) => index = i,
                            NodeChild::Leaf(v) => break v,
                        }
                    }
                })
                .sum();
            total >= stage.threshold
        })
    }

    fn feature_value(&self, tables: &IntegralImages, feature: usize, x: i32, y: i32) -> f64 {
        let f = &self.features[feature];
        f.rects
            .iter()
            .map(|r| {
                let s = if f.tilted {
                    tables.tilted_sum(x + r.x, y + r.y, r.width, r.height)
                } else {
                    tables.rect_sum(x + r.x, y + r.y, r.width, r.height)
                };
                r.weight * s
            })
            .sum()
    }
}
