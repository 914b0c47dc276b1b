//! Frequency-domain texture descriptor of a luma patch.
//!
//! For each superpixel centroid a `side × side` luma window is cut out (shifted
//! inward at the borders), transformed with a 2D DFT and encoded as the
//! row-major magnitudes of the complex spectrum. Trained models depend on this
//! exact encoding, including the window placement rule in [`clamp_origin`].


use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::Plane;
use crate::regions::Centroid;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Image {width}x{height} is smaller than the {side}x{side} patch")]
    ImageTooSmall {
        width: usize,
        height: usize,
        side: usize,
    },

    #[error("Patch side must be positive")]
    ZeroSide,

    #[error("Window has {actual} values, expected {expected}")]
    WindowLen { expected: usize, actual: usize },
}

/// How a fractional centroid coordinate becomes a window origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentroidRounding {
    /// Round half away from zero.
    #[default]
    Nearest,
    /// Truncate toward zero. Matches feature rows produced by older model files.
    Truncate,
}

impl CentroidRounding {
    #[inline]
    fn apply(self, value: f64) -> i64 {
        match self {
            CentroidRounding::Nearest => value.round() as i64,
            CentroidRounding::Truncate => value.trunc() as i64,
        }
    }
}

/// Window origin along one axis: `max(0, min(r, dim - side - 1))`.
///
/// The upper bound keeps one row/column of margin beyond the tight bound
/// `dim - side`; it is kept for parity with existing trained models. When
/// `dim == side` the origin is 0 and the window still fits.
pub fn clamp_origin(
    position: f64,
    dim: usize,
    side: usize,
    rounding: CentroidRounding,
) -> Option<usize> {
    if dim < side {
        return None;
    }
    let upper = dim as i64 - side as i64 - 1;
    let origin = rounding.apply(position).min(upper).max(0);
    Some(origin as usize)
}

/// Encodes luma patches around centroids. Holds the FFT plan for one patch size.
pub struct PatchEncoder {
    side: usize,
    rounding: CentroidRounding,
    fft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for PatchEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchEncoder")
            .field("side", &self.side)
            .field("rounding", &self.rounding)
            .finish()
    }
}

impl PatchEncoder {
    pub fn new(side: usize, rounding: CentroidRounding) -> Result<Self, FeatureError> {
        if side == 0 {
            return Err(FeatureError::ZeroSide);
        }
        let fft = FftPlanner::new().plan_fft_forward(side);
        Ok(Self {
            side,
            rounding,
            fft,
        })
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Length of every feature row: `side²`.
    #[inline]
    pub fn feature_len(&self) -> usize {
        self.side * self.side
    }

    /// Top-left corner `(top, left)` of the window for `centroid`.
    pub fn window_origin(
        &self,
        centroid: Centroid,
        height: usize,
        width: usize,
    ) -> Result<(usize, usize), FeatureError> {
        let too_small = || FeatureError::ImageTooSmall {
            width,
            height,
            side: self.side,
        };
        let top = clamp_origin(centroid.row, height, self.side, self.rounding).ok_or_else(too_small)?;
        let left = clamp_origin(centroid.col, width, self.side, self.rounding).ok_or_else(too_small)?;
        Ok((top, left))
    }

    /// Feature row for the window around `centroid` in `luma`.
    pub fn extract(&self, luma: &Plane<f64>, centroid: Centroid) -> Result<Vec<f64>, FeatureError> {
        let (top, left) = self.window_origin(centroid, luma.height(), luma.width())?;

        let mut window = Vec::with_capacity(self.feature_len());
        for row in top..top + self.side {
            window.extend_from_slice(&luma.row(row)[left..left + self.side]);
        }
        self.encode_window(&window)
    }

    /// Magnitude of the 2D DFT of a row-major `side × side` window, row-major.
    pub fn encode_window(&self, window: &[f64]) -> Result<Vec<f64>, FeatureError> {
        let n = self.side;
        if window.len() != n * n {
            return Err(FeatureError::WindowLen {
                expected: n * n,
                actual: window.len(),
            });
        }

        let mut buffer: Vec<Complex<f64>> = window.iter().map(|&v| Complex::new(v, 0.0)).collect();

        // Rows (the buffer holds `n` consecutive transforms of length `n`).
        self.fft.process(&mut buffer);
        // Columns, via transpose.
        let mut transposed = transpose(&buffer, n);
        self.fft.process(&mut transposed);
        let spectrum = transpose(&transposed, n);

        Ok(spectrum.iter().map(|c| c.norm()).collect())
    }
}

fn transpose(data: &[Complex<f64>], n: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); n * n];
    for row in 0..n {
        for col in 0..n {
            out[col * n + row] = data[row * n + col];
        }
    }
    out
}
