//! Chrominance regression: one model per channel and hyperparameter setting.
//!
//! [`ModelFitter`] turns a [`Dataset`] into `(model_u, model_v)` pairs, either for a
//! single [`SvrParams`] or for every setting of a [`HyperGrid`]. Fitted pairs go to
//! a [`ModelSink`]; [`ModelStore`] is the on-disk one.

mod store;
mod svr;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::Dataset;
use crate::error::Error;

pub use store::ModelStore;
pub use svr::Svr;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("Cannot fit a model on an empty dataset (no feature rows)")]
    EmptyDataset,

    #[error("Invalid hyperparameters: {0}")]
    InvalidParams(String),

    #[error("SVR fit failed: {0}")]
    Svm(#[from] linfa_svm::SvmError),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to create model directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize model '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write model '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Chrominance channel a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    U,
    V,
}

impl Channel {
    pub fn prefix(self) -> &'static str {
        match self {
            Channel::U => "u",
            Channel::V => "v",
        }
    }
}

// ============================================================================
// Hyperparameters
// ============================================================================

/// Epsilon-SVR hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvrParams {
    /// Regularization strength.
    pub c: f64,
    /// Half-width of the loss-free tube around the targets.
    pub epsilon: f64,
}

impl SvrParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(format!("C must be positive, got {}", self.c));
        }
        if !(self.epsilon >= 0.0 && self.epsilon.is_finite()) {
            return Err(format!("epsilon must be non-negative, got {}", self.epsilon));
        }
        Ok(())
    }
}

/// Cartesian grid of C and epsilon values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperGrid {
    pub c_values: Vec<f64>,
    pub epsilon_values: Vec<f64>,
}

impl HyperGrid {
    pub fn len(&self) -> usize {
        self.c_values.len() * self.epsilon_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All settings with their artifact index: C outer, epsilon inner.
    pub fn settings(&self) -> Vec<(usize, SvrParams)> {
        self.c_values
            .iter()
            .flat_map(|&c| self.epsilon_values.iter().map(move |&epsilon| SvrParams { c, epsilon }))
            .enumerate()
            .collect()
    }
}

// ============================================================================
// Fitting
// ============================================================================

/// Single-output regression backend.
pub trait Regressor: Sync {
    type Model: Serialize + Send;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>, params: SvrParams) -> Result<Self::Model, FitError>;
}

/// The two channel models of one hyperparameter setting.
#[derive(Debug, Clone, Serialize)]
pub struct FittedPair<M> {
    pub params: SvrParams,
    pub u: M,
    pub v: M,
}

/// Receives fitted pairs from [`ModelFitter::fit_grid`].
pub trait ModelSink<M> {
    /// Settings for which this returns true are not fitted. Indices still advance.
    fn should_skip(&self, _index: usize) -> bool {
        false
    }

    fn accept(&mut self, index: usize, pair: FittedPair<M>) -> Result<(), Error>;
}

impl<M> ModelSink<M> for Vec<(usize, FittedPair<M>)> {
    fn accept(&mut self, index: usize, pair: FittedPair<M>) -> Result<(), Error> {
        self.push((index, pair));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridSummary {
    pub fitted: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct ModelFitter<R> {
    regressor: R,
}

impl<R: Regressor> ModelFitter<R> {
    pub fn new(regressor: R) -> Self {
        Self { regressor }
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// Fit the U and V models for one setting. The two fits share only `X`.
    pub fn fit_pair(&self, dataset: &Dataset, params: SvrParams) -> Result<FittedPair<R::Model>, FitError> {
        if dataset.is_empty() {
            return Err(FitError::EmptyDataset);
        }
        params.validate().map_err(FitError::InvalidParams)?;

        let x = dataset.feature_matrix();
        let (u, v) = rayon::join(
            || self.fit_channel(&x, &dataset.targets_u(), params, Channel::U),
            || self.fit_channel(&x, &dataset.targets_v(), params, Channel::V),
        );

        Ok(FittedPair { params, u: u?, v: v? })
    }

    /// Fit every grid setting in index order and hand each pair to `sink`.
    pub fn fit_grid<K>(&self, dataset: &Dataset, grid: &HyperGrid, sink: &mut K) -> Result<GridSummary, Error>
    where
        K: ModelSink<R::Model>,
    {
        if dataset.is_empty() {
            return Err(FitError::EmptyDataset.into());
        }

        let mut summary = GridSummary::default();
        for (index, params) in grid.settings() {
            if sink.should_skip(index) {
                tracing::info!(index, c = params.c, epsilon = params.epsilon, "Skipping existing models");
                summary.skipped += 1;
                continue;
            }
            let pair = self.fit_pair(dataset, params)?;
            sink.accept(index, pair)?;
            summary.fitted += 1;
        }
        Ok(summary)
    }

    fn fit_channel(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        params: SvrParams,
        channel: Channel,
    ) -> Result<R::Model, FitError> {
        tracing::info!(
            channel = channel.prefix(),
            rows = x.nrows(),
            c = params.c,
            epsilon = params.epsilon,
            "Fitting model"
        );
        self.regressor.fit(x, y, params)
    }
}
