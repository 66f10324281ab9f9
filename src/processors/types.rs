//! Type definitions shared by the image processors.

use image::{DynamicImage, GrayImage, RgbImage};

pub use crate::core::config::{ChannelOrder, OutputFormat, OutputRange};

/// The role a decoded image plays for the model, which fixes its channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    /// Three-channel color image.
    Color,
    /// Single-channel grayscale image (masks).
    Gray,
}

impl ColorRole {
    /// Number of channels an image in this role carries.
    pub fn channels(&self) -> usize {
        match self {
            ColorRole::Color => 3,
            ColorRole::Gray => 1,
        }
    }
}

/// A decoded 8-bit image.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    /// Interleaved RGB pixels.
    Color(RgbImage),
    /// Grayscale pixels.
    Gray(GrayImage),
}

impl Image {
    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            Image::Color(_) => 3,
            Image::Gray(_) => 1,
        }
    }

    /// Width and height in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Image::Color(img) => img.dimensions(),
            Image::Gray(img) => img.dimensions(),
        }
    }

    /// Returns true if the image has no pixels.
    pub fn is_empty(&self) -> bool {
        let (w, h) = self.dimensions();
        w == 0 || h == 0
    }

    /// Converts into an [`image::DynamicImage`] for the encoder.
    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Image::Color(img) => DynamicImage::ImageRgb8(img),
            Image::Gray(img) => DynamicImage::ImageLuma8(img),
        }
    }
}

impl From<RgbImage> for Image {
    fn from(img: RgbImage) -> Self {
        Image::Color(img)
    }
}

impl From<GrayImage> for Image {
    fn from(img: GrayImage) -> Self {
        Image::Gray(img)
    }
}

/// Spatial size a model expects on its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    /// Width in pixels (last tensor dimension).
    pub width: u32,
    /// Height in pixels (second to last tensor dimension).
    pub height: u32,
}

impl TargetSize {
    /// Creates a new target size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in one plane.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for TargetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
