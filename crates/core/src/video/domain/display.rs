use image::DynamicImage;

/// Named output surfaces, one per kind of image the loop presents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    Capture,
    Crop,
    Edges,
    Contours,
}

impl Surface {
    pub const ALL: [Surface; 4] = [Self::Capture, Self::Crop, Self::Edges, Self::Contours];

    /// Human-readable window title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Capture => "Capture - Ear detection",
            Self::Crop => "Right Ear",
            Self::Edges => "Canny",
            Self::Contours => "Contours",
        }
    }

    /// Stable identifier, safe for file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Crop => "right_ear",
            Self::Edges => "canny",
            Self::Contours => "contours",
        }
    }
}

/// Presents images on persistent named surfaces; each call replaces what
/// the surface showed before.
pub trait FrameDisplay: Send {
    fn show(
        &mut self,
        surface: Surface,
        image: &DynamicImage,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Discards everything.
pub struct NullDisplay;

impl FrameDisplay for NullDisplay {
    fn show(
        &mut self,
        _surface: Surface,
        _image: &DynamicImage,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
