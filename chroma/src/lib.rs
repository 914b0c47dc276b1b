//! Chroma - learning grayscale photo colorization from superpixel texture.
//!
//! The pipeline:
//! - Superpixel segmentation of each training photo, memoized on disk
//! - Per-segment centroid and mean chrominance (YUV)
//! - A frequency-domain luma patch descriptor at every centroid
//! - SVR models mapping descriptors to U and V
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chroma::{Config, DatasetAssembler, ModelFitter, ModelStore, Slic, Svr};
//!
//! let config = Config::default();
//! let assembler = DatasetAssembler::new(&config, Slic::new(config.segmentation.clone()))?;
//! let dataset = assembler.assemble("data/flickr".as_ref())?;
//!
//! let pair = ModelFitter::new(Svr).fit_pair(&dataset, config.svr_params())?;
//! ModelStore::create("models".as_ref())?.save_single("svr.model", &pair)?;
//! ```

pub mod cache;
pub mod color;
pub mod config;
pub mod constants;
pub mod dataset;
mod error;
pub mod features;
pub mod harvest;
pub mod model;
pub mod prepare;
pub mod raster;
pub mod regions;
pub mod segmentation;

#[cfg(test)]
mod testing;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{Config, ConfigError, SegmentationParams};
pub use error::Error;

// ============================================================================
// Images
// ============================================================================

pub use color::{YuvImage, to_yuv};
pub use raster::{Image, ImageDimensions, ImageError, Plane};

// ============================================================================
// Segmentation
// ============================================================================

pub use segmentation::{
    SegmentLabels, SegmentationError, SegmentationStore, SegmentationSummary, Segmenter, Slic,
};

// ============================================================================
// Features and dataset
// ============================================================================

pub use dataset::{AssemblySummary, Dataset, DatasetAssembler, DatasetError};
pub use features::{CentroidRounding, FeatureError, PatchEncoder};
pub use regions::{Centroid, RegionRecord, RegionStats, aggregate};

// ============================================================================
// Model fitting
// ============================================================================

pub use model::{
    FitError, FittedPair, GridSummary, HyperGrid, ModelFitter, ModelSink, ModelStore,
    PersistError, Regressor, Svr, SvrParams,
};
