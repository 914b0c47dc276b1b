use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or constructing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Sample count mismatch: expected {expected} for {width}x{height}x{channels}, got {actual}")]
    SampleCount {
        width: usize,
        height: usize,
        channels: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Image '{path}' is empty")]
    Empty { path: PathBuf },
}
