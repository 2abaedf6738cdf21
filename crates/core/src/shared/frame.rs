use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// A single captured frame: contiguous samples in row-major order.
///
/// Gray, RGB and RGBA layouts are accepted at the capture boundary; the
/// pipeline asks for an [`RgbImage`] and never touches the raw layout.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// A frame without pixels marks the end of the stream.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the frame as RGB, or `None` for an unsupported channel count.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        let (w, h) = (self.width, self.height);
        match self.channels {
            3 => RgbImage::from_raw(w, h, self.data.clone()),
            1 => GrayImage::from_raw(w, h, self.data.clone())
                .map(|gray| DynamicImage::ImageLuma8(gray).to_rgb8()),
            4 => RgbaImage::from_raw(w, h, self.data.clone())
                .map(|rgba| DynamicImage::ImageRgba8(rgba).to_rgb8()),
            _ => None,
        }
    }
}
