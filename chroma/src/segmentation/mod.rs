//! Superpixel segmentation.
//!
//! A [`Segmenter`] partitions an image into labelled regions. [`Slic`] is the
//! built-in implementation; [`SegmentationStore`] memoizes results on disk keyed
//! by (source path, target segment count).

mod labels;
mod slic;
mod store;


use thiserror::Error;

use crate::raster::Image;

pub use labels::{LabelCodec, SegmentLabels};
pub use slic::Slic;
pub use store::{SegmentedImage, SegmentationStore, SegmentationSummary};

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("Cannot segment an empty image")]
    EmptyImage,

    #[error("Target segment count must be positive")]
    ZeroSegments,

    #[error("Unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannels(usize),

    #[error("Label count mismatch: expected {expected} for {width}x{height}, got {actual}")]
    LabelCount {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Label {label} at pixel {index} is out of range for {pixel_count} pixels")]
    LabelOutOfRange {
        label: u32,
        index: usize,
        pixel_count: usize,
    },
}

/// Superpixel segmentation routine.
pub trait Segmenter: Sync {
    /// Partition `image` into roughly `n_segments` regions.
    ///
    /// The returned labels have the image's width and height, and every label in
    /// `0..labels.n_segments()` is used by at least one pixel.
    fn segment(&self, image: &Image, n_segments: usize)
    -> Result<SegmentLabels, SegmentationError>;
}
