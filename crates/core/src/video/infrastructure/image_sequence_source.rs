use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Plays back still images as a stream of frames.
///
/// Opening a directory queues every image inside it, sorted by file name;
/// opening a file queues just that file. Images are decoded lazily with the
/// `image` crate and converted to RGB.
pub struct ImageSequenceSource {
    pending: VecDeque<PathBuf>,
    next_index: usize,
}

impl ImageSequenceSource {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.is_dir() {
            let mut paths: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            if paths.is_empty() {
                return Err(format!("No images found in {}", path.display()).into());
            }
            paths.sort();
            log::info!("Queued {} images from {}", paths.len(), path.display());
            Ok(Self::from_paths(paths))
        } else if path.is_file() {
            Ok(Self::from_paths(vec![path.to_path_buf()]))
        } else {
            Err(format!("Frame source not found: {}", path.display()).into())
        }
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            pending: paths.into(),
            next_index: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let img = image::open(&path)
            .map_err(|e| format!("Failed to decode {}: {e}", path.display()))?
            .to_rgb8();
        let frame = Frame::from_rgb_image(img, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// True when the extension is one of the decodable image formats.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn write_image(dir: &Path, name: &str, value: u8) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(8, 6, image::Rgb([value, value, value]))
            .save(&path)
            .unwrap();
        path
    }

    #[rstest]
    #[case::png("frame.png", true)]
    #[case::upper_jpeg("FRAME.JPEG", true)]
    #[case::video("clip.mp4", false)]
    #[case::no_extension("frame", false)]
    fn test_is_image(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image(Path::new(name)), expected);
    }

    #[test]
    fn test_directory_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "b.png", 20);
        write_image(dir.path(), "a.png", 10);
        write_image(dir.path(), "c.bmp", 30);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 3);

        let mut seen = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            seen.push((frame.index(), frame.data()[0]));
        }
        assert_eq!(seen, vec![(0, 10), (1, 20), (2, 30)]);
    }

    #[test]
    fn test_single_file_yields_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "only.png", 77);
        let mut source = ImageSequenceSource::open(&path).unwrap();

        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (8, 6, 3));
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_path_is_an_error() {
        assert!(ImageSequenceSource::open(Path::new("/nonexistent/frames")).is_err());
    }

    #[test]
    fn test_undecodable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let mut source = ImageSequenceSource::from_paths(vec![path]);
        assert!(source.next_frame().is_err());
    }
}
