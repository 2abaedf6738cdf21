use std::time::Duration;

/// Cascade model loaded from the working directory at startup.
pub const CASCADE_MODEL_NAME: &str = "haar_right_ear.xml";

/// Side length of the normalized ear crop fed to the descriptor builder.
pub const CROP_SIZE: u32 = 200;

/// Gaussian kernel size used to smooth the normalized crop.
pub const CROP_BLUR_KERNEL: u32 = 9;

/// Fraction of the detected width/height added around the selected ear.
pub const ENLARGE_FACTOR: f64 = 0.3;

/// Canny low threshold as a fraction of the Otsu level (used as high threshold).
pub const CANNY_LOW_RATIO: f32 = 0.5;

pub const DETECTION_SCALE_FACTOR: f64 = 1.1;
pub const DETECTION_MIN_NEIGHBORS: usize = 2;
pub const DETECTION_MIN_SIZE: (u32, u32) = (30, 30);

/// How long each iteration waits for a key action.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub const QUIT_KEY: char = 'c';
pub const SAVE_KEY: char = 'a';
pub const PAUSE_KEY: char = ' ';

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
