//! Crate-level error type.

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::dataset::DatasetError;
use crate::features::FeatureError;
use crate::model::{FitError, PersistError};
use crate::raster::ImageError;
use crate::regions::RegionError;
use crate::segmentation::SegmentationError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl Error {
    /// Errors that must abort the whole run instead of skipping one image.
    ///
    /// Failing to create an output directory (segmentation cache, model output)
    /// would fail identically for every remaining unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Cache(CacheError::CreateDir { .. })
                | Error::Persist(PersistError::CreateDir { .. })
                | Error::Config(_)
        )
    }
}
