//! Decoded raster images as normalized floating-point samples.
//!
//! An [`Image`] is either single-channel (grayscale) or three-channel (RGB),
//! interleaved row-major, with samples in `[0, 1]`. Downstream stages branch on
//! [`ImageDimensions::is_grayscale`].

mod error;
mod plane;

#[cfg(test)]
mod tests;

use std::path::Path;

use image::{ColorType, DynamicImage};

pub use error::ImageError;
pub use plane::Plane;

/// Image dimensions and channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl ImageDimensions {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.channels
    }

    #[inline]
    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    #[inline]
    pub fn is_rgb(&self) -> bool {
        self.channels == 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    dimensions: ImageDimensions,
    samples: Vec<f32>,
}

impl Image {
    /// Decode an image file into normalized samples.
    ///
    /// Luma and luma+alpha sources become grayscale; everything else becomes RGB
    /// (alpha is dropped).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| ImageError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ImageError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self::from_dynamic(&decoded))
    }

    pub fn from_dynamic(decoded: &DynamicImage) -> Self {
        let width = decoded.width() as usize;
        let height = decoded.height() as usize;

        match decoded.color() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                let luma = decoded.to_luma32f();
                Self {
                    dimensions: ImageDimensions::new(width, height, 1),
                    samples: luma.into_raw(),
                }
            }
            _ => {
                let rgb = decoded.to_rgb32f();
                Self {
                    dimensions: ImageDimensions::new(width, height, 3),
                    samples: rgb.into_raw(),
                }
            }
        }
    }

    pub fn from_gray(width: usize, height: usize, samples: Vec<f32>) -> Result<Self, ImageError> {
        Self::from_samples(ImageDimensions::new(width, height, 1), samples)
    }

    /// Build an RGB image from interleaved `r, g, b` samples.
    pub fn from_rgb(width: usize, height: usize, samples: Vec<f32>) -> Result<Self, ImageError> {
        Self::from_samples(ImageDimensions::new(width, height, 3), samples)
    }

    fn from_samples(dimensions: ImageDimensions, samples: Vec<f32>) -> Result<Self, ImageError> {
        if samples.len() != dimensions.sample_count() {
            return Err(ImageError::SampleCount {
                width: dimensions.width,
                height: dimensions.height,
                channels: dimensions.channels,
                expected: dimensions.sample_count(),
                actual: samples.len(),
            });
        }
        Ok(Self {
            dimensions,
            samples,
        })
    }

    #[inline]
    pub fn dimensions(&self) -> ImageDimensions {
        self.dimensions
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dimensions.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dimensions.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.dimensions.channels
    }

    /// Interleaved samples, row-major.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Channel values of the pixel at `(row, col)`.
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> &[f32] {
        debug_assert!(row < self.height() && col < self.width());
        let channels = self.channels();
        let idx = (row * self.width() + col) * channels;
        &self.samples[idx..idx + channels]
    }

    /// Extract one channel as a plane.
    pub fn channel(&self, channel: usize) -> Plane<f32> {
        assert!(channel < self.channels(), "channel out of range");
        let data = self
            .samples
            .chunks_exact(self.channels())
            .map(|px| px[channel])
            .collect();
        Plane::new(self.width(), self.height(), data)
    }
}
