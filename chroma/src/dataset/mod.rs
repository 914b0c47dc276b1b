//! Dataset assembly: feature rows and chrominance targets over an image tree.

mod assembler;


use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::color::YuvImage;
use crate::error::Error;
use crate::features::PatchEncoder;
use crate::regions;
use crate::segmentation::SegmentLabels;

pub use assembler::{AssemblySummary, DatasetAssembler, ImageSamples};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Feature row has {actual} values, dataset expects {expected}")]
    FeatureLenMismatch { expected: usize, actual: usize },
}

/// Feature matrix `X` (row-major) with targets `U` and `V`.
///
/// Row count of `X` equals the length of both target vectors at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_len: usize,
    features: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
}

impl Dataset {
    pub fn new(feature_len: usize) -> Self {
        Self {
            feature_len,
            features: Vec::new(),
            u: Vec::new(),
            v: Vec::new(),
        }
    }

    pub fn push(&mut self, features: &[f64], u: f64, v: f64) -> Result<(), DatasetError> {
        if features.len() != self.feature_len {
            return Err(DatasetError::FeatureLenMismatch {
                expected: self.feature_len,
                actual: features.len(),
            });
        }
        self.features.extend_from_slice(features);
        self.u.push(u);
        self.v.push(v);
        Ok(())
    }

    /// Append all rows of `other` after the rows of `self`.
    pub fn append(&mut self, other: Dataset) -> Result<(), DatasetError> {
        if other.feature_len != self.feature_len && !other.is_empty() {
            return Err(DatasetError::FeatureLenMismatch {
                expected: self.feature_len,
                actual: other.feature_len,
            });
        }
        self.features.extend(other.features);
        self.u.extend(other.u);
        self.v.extend(other.v);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.u.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.u.is_empty()
    }

    #[inline]
    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.features[index * self.feature_len..(index + 1) * self.feature_len]
    }

    pub fn u(&self) -> &[f64] {
        &self.u
    }

    pub fn v(&self) -> &[f64] {
        &self.v
    }

    pub fn feature_matrix(&self) -> Array2<f64> {
        let f = self.feature_len;
        Array2::from_shape_fn((self.len(), f), |(i, j)| self.features[i * f + j])
    }

    pub fn targets_u(&self) -> Array1<f64> {
        Array1::from(self.u.clone())
    }

    pub fn targets_v(&self) -> Array1<f64> {
        Array1::from(self.v.clone())
    }
}

/// Feature rows and chrominance targets of one image, one row per non-empty segment.
pub fn extract_samples(
    yuv: &YuvImage,
    labels: &SegmentLabels,
    encoder: &PatchEncoder,
) -> Result<Dataset, Error> {
    let records = regions::aggregate(yuv, labels)?;
    let mut samples = Dataset::new(encoder.feature_len());

    for stats in records.iter().filter_map(|r| r.stats) {
        let row = encoder.extract(&yuv.y, stats.centroid)?;
        samples.push(&row, stats.mean_u, stats.mean_v)?;
    }

    Ok(samples)
}
