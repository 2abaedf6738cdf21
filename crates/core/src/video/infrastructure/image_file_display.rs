use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::video::domain::display::{FrameDisplay, Surface};

/// Mirrors every surface to `<dir>/<surface>.png`, overwriting the file on
/// each update so the directory always holds the latest view.
pub struct ImageFileDisplay {
    dir: PathBuf,
}

impl ImageFileDisplay {
    pub fn new(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, surface: Surface) -> PathBuf {
        self.dir.join(format!("{}.png", surface.slug()))
    }
}

impl FrameDisplay for ImageFileDisplay {
    fn show(
        &mut self,
        surface: Surface,
        image: &DynamicImage,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.path_for(surface);
        image.save(&path)?;
        log::trace!("{} -> {}", surface.title(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_creates_directory_and_writes_surface() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("preview");
        let mut display = ImageFileDisplay::new(&target).unwrap();

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 8, Rgb([50, 100, 200])));
        display.show(Surface::Capture, &img).unwrap();

        let written = image::open(target.join("capture.png")).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (12, 8));
        assert_eq!(written.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_show_overwrites_previous_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut display = ImageFileDisplay::new(dir.path()).unwrap();

        let first = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([10])));
        let second = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 3, Luma([240])));
        display.show(Surface::Edges, &first).unwrap();
        display.show(Surface::Edges, &second).unwrap();

        let written = image::open(display.path_for(Surface::Edges)).unwrap().to_luma8();
        assert_eq!(written.dimensions(), (6, 3));
        assert_eq!(written.get_pixel(0, 0)[0], 240);
    }

    #[test]
    fn test_surfaces_map_to_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let display = ImageFileDisplay::new(dir.path()).unwrap();
        assert_eq!(display.path_for(Surface::Crop), dir.path().join("right_ear.png"));
        assert_ne!(display.path_for(Surface::Crop), display.path_for(Surface::Contours));
    }

    #[test]
    fn test_directory_under_a_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        assert!(ImageFileDisplay::new(&blocker.join("preview")).is_err());
    }
}
