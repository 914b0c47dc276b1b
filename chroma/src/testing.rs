//! Test helpers: synthetic images and instrumented collaborators.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::raster::Image;
use crate::segmentation::{SegmentLabels, SegmentationError, Segmenter};

/// RGB image whose left half is `left` and right half is `right`.
pub fn split_image(width: usize, height: usize, left: [f32; 3], right: [f32; 3]) -> Image {
    let mut samples = Vec::with_capacity(width * height * 3);
    for _ in 0..height {
        for col in 0..width {
            let px = if col < width / 2 { left } else { right };
            samples.extend_from_slice(&px);
        }
    }
    Image::from_rgb(width, height, samples).unwrap()
}

/// RGB image with a horizontal red ramp and a vertical green ramp.
pub fn gradient_image(width: usize, height: usize) -> Image {
    let mut samples = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        for col in 0..width {
            samples.push(col as f32 / width.max(2) as f32);
            samples.push(row as f32 / height.max(2) as f32);
            samples.push(0.5);
        }
    }
    Image::from_rgb(width, height, samples).unwrap()
}

/// Save an 8-bit RGB gradient as `path` (format from the extension).
pub fn write_gradient_file(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

/// Save an 8-bit grayscale image as `path` in JPEG format.
pub fn write_gray_file(path: &Path, width: u32, height: u32) {
    let img = image::GrayImage::from_fn(width, height, |x, y| image::Luma([((x + y) * 7 % 256) as u8]));
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

/// Segmenter that tiles the image into `block`×`block` squares and counts calls.
#[derive(Debug)]
pub struct CountingSegmenter {
    pub block: usize,
    calls: AtomicUsize,
}

impl CountingSegmenter {
    pub fn new(block: usize) -> Self {
        Self {
            block,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Segmenter for CountingSegmenter {
    fn segment(
        &self,
        image: &Image,
        _n_segments: usize,
    ) -> Result<SegmentLabels, SegmentationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let blocks_per_row = image.width().div_ceil(self.block);
        let labels = (0..image.height())
            .flat_map(|row| {
                (0..image.width())
                    .map(move |col| ((row / self.block) * blocks_per_row + col / self.block) as u32)
            })
            .collect();
        SegmentLabels::from_raw(image.width(), image.height(), labels)
    }
}
