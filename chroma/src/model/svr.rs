use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};

use super::{FitError, Regressor, SvrParams};

/// Epsilon-SVR with an RBF kernel.
///
/// The kernel width follows the "scale" heuristic: `gamma = 1 / (n_features · var(X))`.
/// linfa parameterizes the Gaussian kernel by `1 / gamma`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Svr;

impl Svr {
    pub fn kernel_width(x: &Array2<f64>) -> f64 {
        let Some(&origin) = x.iter().next() else {
            return 1.0;
        };
        // Variance about the first element, so a constant matrix gives exactly zero.
        let n = x.len() as f64;
        let mean_shift = x.iter().map(|&v| v - origin).sum::<f64>() / n;
        let var = x
            .iter()
            .map(|&v| {
                let d = v - origin - mean_shift;
                d * d
            })
            .sum::<f64>()
            / n;

        let mean = origin + mean_shift;
        if !var.is_finite() || var <= f64::EPSILON * mean.abs().max(1.0).powi(2) {
            return 1.0;
        }
        x.ncols() as f64 * var
    }
}

impl Regressor for Svr {
    type Model = Svm<f64, f64>;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>, params: SvrParams) -> Result<Self::Model, FitError> {
        let dataset = Dataset::new(x.clone(), y.clone());
        let model = Svm::<f64, f64>::params()
            .c_svr(params.c, Some(params.epsilon))
            .gaussian_kernel(Self::kernel_width(x))
            .fit(&dataset)?;
        Ok(model)
    }
}
