//! Pipeline configuration.
//!
//! A single flat [`Config`] is passed into every component call, so tests can
//! vary segment counts, patch sizes and hyperparameter grids per case. All
//! fields have defaults from [`crate::constants`]; a JSON file only needs to
//! list the fields it overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::features::CentroidRounding;
use crate::model::{HyperGrid, SvrParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Segmentation
// ============================================================================

/// Parameters of the SLIC superpixel segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Color vs. space trade-off. Higher values give more compact, grid-like segments.
    pub compactness: f64,
    /// Standard deviation of the Gaussian pre-smoothing (0 disables smoothing).
    pub sigma: f64,
    pub max_iterations: usize,
    /// Merge disconnected fragments into neighboring segments.
    pub enforce_connectivity: bool,
    /// Fragments below `min_size_factor * pixels / n_segments` are merged.
    pub min_size_factor: f64,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            compactness: SLIC_COMPACTNESS,
            sigma: SLIC_SIGMA,
            max_iterations: SLIC_MAX_ITERATIONS,
            enforce_connectivity: true,
            min_size_factor: SLIC_MIN_SIZE_FACTOR,
        }
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -- Segmentation --
    /// Target superpixel count per image. Also part of the segmentation cache key.
    pub n_segments: usize,
    pub segmentation: SegmentationParams,
    /// Directory for segmentation cache files. `None` stores them beside the source image.
    pub cache_dir: Option<PathBuf>,

    // -- Features --
    /// Side of the square luma patch; feature rows have `patch_side²` entries.
    pub patch_side: usize,
    pub centroid_rounding: CentroidRounding,

    // -- Dataset --
    /// Image file extensions (without dot, matched case-insensitively).
    pub image_extensions: Vec<String>,
    pub max_concurrent_images: usize,

    // -- Model fitting --
    /// Regularization for single-setting mode.
    pub c: f64,
    /// Epsilon-tube width for single-setting mode.
    pub epsilon: f64,
    /// Grid-mode C values (outer loop).
    pub c_grid: Vec<f64>,
    /// Grid-mode epsilon values (inner loop).
    pub epsilon_grid: Vec<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n_segments: N_SEGMENTS,
            segmentation: SegmentationParams::default(),
            cache_dir: None,
            patch_side: SQUARE_SIZE,
            centroid_rounding: CentroidRounding::default(),
            image_extensions: vec!["jpg".to_string()],
            max_concurrent_images: MAX_CONCURRENT_IMAGES,
            c: C,
            epsilon: SVR_EPSILON,
            c_grid: C_LIST.to_vec(),
            epsilon_grid: EPSILON_LIST.to_vec(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.n_segments == 0 {
            return invalid("n_segments must be positive".into());
        }
        if self.patch_side == 0 {
            return invalid("patch_side must be positive".into());
        }
        if self.max_concurrent_images == 0 {
            return invalid("max_concurrent_images must be positive".into());
        }
        if self.image_extensions.is_empty() {
            return invalid("image_extensions must not be empty".into());
        }
        if !(self.segmentation.compactness > 0.0) {
            return invalid(format!(
                "segmentation.compactness must be positive, got {}",
                self.segmentation.compactness
            ));
        }
        if !(self.segmentation.sigma >= 0.0) {
            return invalid(format!(
                "segmentation.sigma must be non-negative, got {}",
                self.segmentation.sigma
            ));
        }
        if self.segmentation.max_iterations == 0 {
            return invalid("segmentation.max_iterations must be positive".into());
        }
        if !(self.segmentation.min_size_factor >= 0.0 && self.segmentation.min_size_factor.is_finite()) {
            return invalid(format!(
                "segmentation.min_size_factor must be finite and non-negative, got {}",
                self.segmentation.min_size_factor
            ));
        }
        self.svr_params().validate().map_err(ConfigError::Invalid)?;
        for (_, params) in self.hyper_grid().settings() {
            params.validate().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    /// Hyperparameters of single-setting mode.
    pub fn svr_params(&self) -> SvrParams {
        SvrParams {
            c: self.c,
            epsilon: self.epsilon,
        }
    }

    /// Hyperparameter grid of grid mode.
    pub fn hyper_grid(&self) -> HyperGrid {
        HyperGrid {
            c_values: self.c_grid.clone(),
            epsilon_values: self.epsilon_grid.clone(),
        }
    }

    /// Feature vector length implied by `patch_side`.
    pub fn feature_len(&self) -> usize {
        self.patch_side * self.patch_side
    }
}
