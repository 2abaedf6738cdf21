use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use earmatch_core::descriptor::domain::shape_matcher::{MatchMethod, ShapeMatcher};
use earmatch_core::detection::infrastructure::haar_cascade_detector::HaarCascadeDetector;
use earmatch_core::pipeline::ear_pipeline::EarPipeline;
use earmatch_core::pipeline::frame_loop::FrameLoop;
use earmatch_core::pipeline::pipeline_logger::ConsolePipelineLogger;
use earmatch_core::shared::constants::{CASCADE_MODEL_NAME, QUIT_KEY, SAVE_KEY};
use earmatch_core::video::domain::display::{FrameDisplay, NullDisplay};
use earmatch_core::video::domain::frame_source::FrameSource;
use earmatch_core::video::infrastructure::image_file_display::ImageFileDisplay;
use earmatch_core::video::infrastructure::image_sequence_source::{is_image, ImageSequenceSource};
use earmatch_core::video::infrastructure::stdin_key_input::StdinKeyInput;

/// Detects a right ear in every frame and scores its shape against a saved
/// reference. Scores are printed to stdout, one line per compared frame.
///
/// Controls are read from stdin, one per line: `a` saves the current ear as
/// the reference, a space or `p` pauses and resumes, `c` quits. Empty lines
/// are ignored.
#[derive(Parser)]
#[command(name = "earmatch")]
struct Cli {
    /// Image file, directory of images, or (with the ffmpeg feature) a video
    /// file or capture device.
    source: PathBuf,

    /// Write the latest view of every window to this directory as PNG.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Hu-moment distance: i1, i2 or i3.
    #[arg(long, default_value = "i1")]
    match_method: String,

    /// Force an ffmpeg input format, e.g. v4l2 for a webcam.
    #[cfg(feature = "ffmpeg")]
    #[arg(long)]
    input_format: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let method: MatchMethod = cli.match_method.parse()?;

    let detector = HaarCascadeDetector::from_file(Path::new(CASCADE_MODEL_NAME))?;
    let source = open_source(&cli)?;
    let display = build_display(cli.preview_dir.as_deref())?;

    log::info!("Controls: '{SAVE_KEY}' save reference, space or 'p' pause, '{QUIT_KEY}' quit");

    let pipeline = EarPipeline::new(Box::new(detector), ShapeMatcher::new(method));
    let mut frame_loop = FrameLoop::new(
        pipeline,
        source,
        Box::new(StdinKeyInput::spawn()),
        display,
    );
    let mut logger = ConsolePipelineLogger::default();
    frame_loop.run(&mut logger)
}

fn open_source(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    let path = cli.source.as_path();
    if path.is_dir() || is_image(path) {
        return Ok(Box::new(ImageSequenceSource::open(path)?));
    }
    open_video(cli)
}

#[cfg(feature = "ffmpeg")]
fn open_video(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    use earmatch_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;

    Ok(Box::new(FfmpegFrameSource::open(
        &cli.source,
        cli.input_format.as_deref(),
    )?))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_video(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    Err(format!(
        "{} is not an image or directory; video input needs the `ffmpeg` feature",
        cli.source.display()
    )
    .into())
}

fn build_display(
    preview_dir: Option<&Path>,
) -> Result<Box<dyn FrameDisplay>, Box<dyn std::error::Error>> {
    match preview_dir {
        Some(dir) => {
            log::info!("Writing previews to {}", dir.display());
            Ok(Box::new(ImageFileDisplay::new(dir)?))
        }
        None => Ok(Box::new(NullDisplay)),
    }
}
