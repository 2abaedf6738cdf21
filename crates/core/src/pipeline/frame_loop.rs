use std::time::Duration;

use image::DynamicImage;

use super::ear_pipeline::{EarPipeline, FrameAnalysis};
use super::pipeline_logger::PipelineLogger;
use super::rendering::render_contours;
use crate::descriptor::domain::shape_descriptor::ShapeDescriptor;
use crate::session::session_state::SessionState;
use crate::shared::constants::INPUT_POLL_INTERVAL;
use crate::shared::frame::Frame;
use crate::video::domain::display::{FrameDisplay, Surface};
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::key_input::{KeyAction, KeyInput};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
}

impl LoopState {
    /// Quit wins from any state; pause toggles; save leaves the state alone.
    pub fn on_action(self, action: KeyAction) -> Self {
        match (self, action) {
            (_, KeyAction::Quit) => Self::Stopped,
            (Self::Running, KeyAction::TogglePause) => Self::Paused,
            (Self::Paused, KeyAction::TogglePause) => Self::Running,
            (state, _) => state,
        }
    }
}

/// Interactive capture loop: pulls frames while running, shows every
/// surface, and reacts to control keys between frames.
///
/// While paused no frames are acquired, the surfaces keep their last
/// content, and input is still polled so the loop can resume, save or quit.
pub struct FrameLoop {
    pipeline: EarPipeline,
    source: Box<dyn FrameSource>,
    input: Box<dyn KeyInput>,
    display: Box<dyn FrameDisplay>,
    session: SessionState,
    state: LoopState,
    last_descriptor: Option<ShapeDescriptor>,
    poll_interval: Duration,
}

impl FrameLoop {
    pub fn new(
        pipeline: EarPipeline,
        source: Box<dyn FrameSource>,
        input: Box<dyn KeyInput>,
        display: Box<dyn FrameDisplay>,
    ) -> Self {
        Self {
            pipeline,
            source,
            input,
            display,
            session: SessionState::new(),
            state: LoopState::Running,
            last_descriptor: None,
            poll_interval: INPUT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Steps until the stream ends or the user quits.
    pub fn run(
        &mut self,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), Box<dyn std::error::Error>> {
        while self.state != LoopState::Stopped {
            self.step(logger)?;
        }
        logger.summary();
        Ok(())
    }

    /// One iteration: acquire and process a frame when running, then poll
    /// input once.
    pub fn step(
        &mut self,
        logger: &mut dyn PipelineLogger,
    ) -> Result<LoopState, Box<dyn std::error::Error>> {
        if self.state == LoopState::Running {
            match self.source.next_frame()? {
                Some(frame) if !frame.is_empty() => self.process(&frame, logger)?,
                _ => {
                    logger.info("End of stream");
                    self.state = LoopState::Stopped;
                    return Ok(self.state);
                }
            }
        }

        if let Some(action) = self.input.poll(self.poll_interval) {
            self.handle(action, logger);
        }
        Ok(self.state)
    }

    fn process(
        &mut self,
        frame: &Frame,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), Box<dyn std::error::Error>> {
        logger.frame(frame.index());
        let analysis = self.pipeline.analyze(frame, &self.session, logger)?;
        self.last_descriptor = analysis.descriptor().cloned();
        self.show(analysis)
    }

    fn show(&mut self, analysis: FrameAnalysis) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(crop) = analysis.crop {
            self.display
                .show(Surface::Crop, &DynamicImage::ImageLuma8(crop))?;
        }
        if let Some(build) = analysis.build {
            let drawing = build.descriptor.as_ref().map(|descriptor| {
                render_contours(descriptor, self.session.get(), build.edges.dimensions())
            });
            self.display
                .show(Surface::Edges, &DynamicImage::ImageLuma8(build.edges))?;
            if let Some(drawing) = drawing {
                self.display
                    .show(Surface::Contours, &DynamicImage::ImageRgb8(drawing))?;
            }
        }
        self.display
            .show(Surface::Capture, &DynamicImage::ImageRgb8(analysis.annotated))
    }

    fn handle(&mut self, action: KeyAction, logger: &mut dyn PipelineLogger) {
        if action == KeyAction::Save {
            self.save_reference(logger);
        }
        let next = self.state.on_action(action);
        if next != self.state {
            log::debug!("{:?} -> {next:?} on {action:?}", self.state);
        }
        self.state = next;
    }

    fn save_reference(&mut self, logger: &mut dyn PipelineLogger) {
        match &self.last_descriptor {
            Some(descriptor) if self.session.save(descriptor) => {
                logger.info(&format!("Reference saved ({} points)", descriptor.len()));
            }
            _ => logger.info("Nothing to save: no ear descriptor in the latest frame"),
        }
    }
}
