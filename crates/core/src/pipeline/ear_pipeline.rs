use std::time::Instant;

use image::{imageops, GrayImage, RgbImage};
use imageproc::contrast::equalize_histogram;

use super::pipeline_logger::PipelineLogger;
use super::rendering::draw_detection;
use crate::descriptor::domain::descriptor_builder::{DescriptorBuild, DescriptorBuilder};
use crate::descriptor::domain::normalized_crop::{crop_gray, NormalizedCrop};
use crate::descriptor::domain::shape_descriptor::ShapeDescriptor;
use crate::descriptor::domain::shape_matcher::{MatchScore, ShapeMatcher};
use crate::detection::domain::region_detector::RegionDetector;
use crate::detection::domain::region_selector::RegionSelector;
use crate::session::session_state::SessionState;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Everything one frame produced on its way through the pipeline.
///
/// Later stages are `None` when an earlier one found nothing to work on.
pub struct FrameAnalysis {
    /// The captured frame, with the selected ear outlined when there is one.
    pub annotated: RgbImage,
    pub region: Option<Region>,
    /// `region` enlarged and clamped to the frame.
    pub crop_region: Option<Region>,
    pub crop: Option<GrayImage>,
    pub build: Option<DescriptorBuild>,
    pub score: Option<MatchScore>,
}

impl FrameAnalysis {
    fn detected_nothing(annotated: RgbImage) -> Self {
        Self {
            annotated,
            region: None,
            crop_region: None,
            crop: None,
            build: None,
            score: None,
        }
    }

    pub fn descriptor(&self) -> Option<&ShapeDescriptor> {
        self.build.as_ref().and_then(|b| b.descriptor.as_ref())
    }
}

/// Detect, crop, describe and match a single frame.
pub struct EarPipeline {
    detector: Box<dyn RegionDetector>,
    selector: RegionSelector,
    builder: DescriptorBuilder,
    matcher: ShapeMatcher,
}

impl EarPipeline {
    pub fn new(detector: Box<dyn RegionDetector>, matcher: ShapeMatcher) -> Self {
        Self {
            detector,
            selector: RegionSelector::default(),
            builder: DescriptorBuilder::default(),
            matcher,
        }
    }

    /// Runs one frame through every stage. A score is produced only when
    /// both a descriptor and a saved reference exist.
    pub fn analyze(
        &mut self,
        frame: &Frame,
        session: &SessionState,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameAnalysis, Box<dyn std::error::Error>> {
        let mut annotated = frame.to_rgb_image().ok_or_else(|| {
            format!(
                "Frame {} has unsupported layout ({}x{}, {} channels)",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels()
            )
        })?;
        let gray = equalized_gray(&annotated);

        let t0 = Instant::now();
        let regions = self.detector.detect(&gray)?;
        logger.timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
        logger.metric("regions", regions.len() as f64);

        let Some(region) = self.selector.select_largest(&regions) else {
            return Ok(FrameAnalysis::detected_nothing(annotated));
        };
        draw_detection(&mut annotated, &region);

        let crop_region = self.selector.enlarge(&region, gray.width(), gray.height());
        let Some(crop) = crop_gray(&gray, &crop_region) else {
            log::debug!("Frame {}: empty crop for {crop_region:?}", frame.index());
            let mut analysis = FrameAnalysis::detected_nothing(annotated);
            analysis.region = Some(region);
            analysis.crop_region = Some(crop_region);
            return Ok(analysis);
        };

        let t1 = Instant::now();
        let build = self.builder.build(&NormalizedCrop::from_image(&crop));
        logger.timing("describe", t1.elapsed().as_secs_f64() * 1000.0);
        logger.metric("contours", build.contour_count as f64);

        let score = match (build.descriptor.as_ref(), session.get()) {
            (Some(current), Some(reference)) => {
                let t2 = Instant::now();
                let score = self.matcher.compare(current, reference);
                logger.timing("match", t2.elapsed().as_secs_f64() * 1000.0);
                logger.score(frame.index(), score);
                Some(score)
            }
            _ => None,
        };

        Ok(FrameAnalysis {
            annotated,
            region: Some(region),
            crop_region: Some(crop_region),
            crop: Some(crop),
            build: Some(build),
            score,
        })
    }
}

/// Luma conversion followed by histogram equalization: the image both the
/// detector and the crop are taken from.
pub fn equalized_gray(rgb: &RgbImage) -> GrayImage {
    equalize_histogram(&imageops::grayscale(rgb))
}
