use linfa::prelude::Predict;
use ndarray::{Array1, Array2};

use super::*;

/// Predicts the target mean; records the parameters it was called with.
#[derive(Debug, Default)]
struct MeanRegressor;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct MeanModel {
    mean: f64,
    params: SvrParams,
}

impl Regressor for MeanRegressor {
    type Model = MeanModel;

    fn fit(&self, _x: &Array2<f64>, y: &Array1<f64>, params: SvrParams) -> Result<MeanModel, FitError> {
        Ok(MeanModel {
            mean: y.sum() / y.len() as f64,
            params,
        })
    }
}

fn small_dataset() -> Dataset {
    let mut ds = Dataset::new(2);
    ds.push(&[0.0, 1.0], 0.1, -0.3).unwrap();
    ds.push(&[1.0, 0.0], 0.3, -0.1).unwrap();
    ds
}

fn grid_2x3() -> HyperGrid {
    HyperGrid {
        c_values: vec![0.5, 1.0],
        epsilon_values: vec![0.01, 0.1, 0.2],
    }
}

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

#[test]
fn test_grid_settings_are_c_major() {
    let settings = grid_2x3().settings();
    let expected = [
        (0.5, 0.01),
        (0.5, 0.1),
        (0.5, 0.2),
        (1.0, 0.01),
        (1.0, 0.1),
        (1.0, 0.2),
    ];

    assert_eq!(settings.len(), 6);
    for (i, ((index, params), (c, epsilon))) in settings.iter().zip(expected).enumerate() {
        assert_eq!(*index, i);
        assert_eq!(*params, SvrParams { c, epsilon });
    }
}

#[test]
fn test_empty_grid() {
    let grid = HyperGrid {
        c_values: vec![1.0],
        epsilon_values: vec![],
    };
    assert!(grid.is_empty());
    assert!(grid.settings().is_empty());
}

#[test]
fn test_params_validation_messages() {
    assert!(SvrParams { c: 1.0, epsilon: 0.0 }.validate().is_ok());

    let err = SvrParams { c: 0.0, epsilon: 0.1 }.validate().unwrap_err();
    assert!(err.contains("C must be positive"));

    let err = SvrParams { c: 1.0, epsilon: -0.1 }.validate().unwrap_err();
    assert!(err.contains("epsilon must be non-negative"));

    assert!(SvrParams { c: f64::NAN, epsilon: 0.1 }.validate().is_err());
}

// ---------------------------------------------------------------------------
// ModelFitter
// ---------------------------------------------------------------------------

#[test]
fn test_fit_pair_fits_channels_independently() {
    let fitter = ModelFitter::new(MeanRegressor);
    let params = SvrParams { c: 1.0, epsilon: 0.1 };
    let pair = fitter.fit_pair(&small_dataset(), params).unwrap();

    assert_eq!(pair.params, params);
    assert!((pair.u.mean - 0.2).abs() < 1e-12);
    assert!((pair.v.mean + 0.2).abs() < 1e-12);
}

#[test]
fn test_empty_dataset_fails_descriptively() {
    let fitter = ModelFitter::new(MeanRegressor);
    let empty = Dataset::new(4);

    let err = fitter
        .fit_pair(&empty, SvrParams { c: 1.0, epsilon: 0.1 })
        .unwrap_err();
    assert!(matches!(err, FitError::EmptyDataset));
    assert!(err.to_string().contains("empty dataset"));

    let mut sink = Vec::new();
    let err = fitter.fit_grid(&empty, &grid_2x3(), &mut sink).unwrap_err();
    assert!(matches!(err, Error::Fit(FitError::EmptyDataset)));
    assert!(sink.is_empty());
}

#[test]
fn test_invalid_params_are_rejected_before_fitting() {
    let fitter = ModelFitter::new(MeanRegressor);
    let err = fitter
        .fit_pair(&small_dataset(), SvrParams { c: -1.0, epsilon: 0.1 })
        .unwrap_err();
    assert!(matches!(err, FitError::InvalidParams(_)));
}

#[test]
fn test_grid_fits_six_pairs_in_order() {
    let fitter = ModelFitter::new(MeanRegressor);
    let mut sink = Vec::new();

    let summary = fitter.fit_grid(&small_dataset(), &grid_2x3(), &mut sink).unwrap();

    assert_eq!(summary, GridSummary { fitted: 6, skipped: 0 });
    let indices: Vec<usize> = sink.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    for ((_, pair), (_, params)) in sink.iter().zip(grid_2x3().settings()) {
        assert_eq!(pair.params, params);
        assert_eq!(pair.u.params, params);
        assert_eq!(pair.v.params, params);
    }
}

// ---------------------------------------------------------------------------
// ModelStore
// ---------------------------------------------------------------------------

#[test]
fn test_store_naming() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::create(dir.path()).unwrap();

    assert_eq!(store.single_path(Channel::U, "svr.model"), dir.path().join("u_svr.model"));
    assert_eq!(store.single_path(Channel::V, "svr.model"), dir.path().join("v_svr.model"));
    assert_eq!(store.grid_path(Channel::U, 3), dir.path().join("u_svr3.model"));
    assert_eq!(store.grid_path(Channel::V, 0), dir.path().join("v_svr0.model"));
}

#[test]
fn test_store_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let models = dir.path().join("out/models");
    let store = ModelStore::create(&models).unwrap();
    assert!(models.is_dir());
    assert_eq!(store.dir(), models);
}

#[test]
fn test_save_single_writes_both_channels() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::create(dir.path()).unwrap();
    let pair = ModelFitter::new(MeanRegressor)
        .fit_pair(&small_dataset(), SvrParams { c: 1.0, epsilon: 0.1 })
        .unwrap();

    store.save_single("svr.model", &pair).unwrap();

    let u: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("u_svr.model")).unwrap()).unwrap();
    let v: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("v_svr.model")).unwrap()).unwrap();
    assert!((u["mean"].as_f64().unwrap() - 0.2).abs() < 1e-12);
    assert!((v["mean"].as_f64().unwrap() + 0.2).abs() < 1e-12);
}

#[test]
fn test_grid_writes_indexed_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ModelStore::create(dir.path()).unwrap();

    ModelFitter::new(MeanRegressor)
        .fit_grid(&small_dataset(), &grid_2x3(), &mut store)
        .unwrap();

    for i in 0..6 {
        assert!(store.grid_path(Channel::U, i).is_file(), "u_svr{i}");
        assert!(store.grid_path(Channel::V, i).is_file(), "v_svr{i}");
    }
    assert!(!store.grid_path(Channel::U, 6).exists());
}

#[test]
fn test_resume_skips_complete_pairs_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ModelStore::create(dir.path()).unwrap().with_resume(true);
    std::fs::write(store.grid_path(Channel::U, 0), b"existing").unwrap();
    std::fs::write(store.grid_path(Channel::V, 0), b"existing").unwrap();
    // Half-written pair is refitted.
    std::fs::write(store.grid_path(Channel::U, 1), b"existing").unwrap();

    let summary = ModelFitter::new(MeanRegressor)
        .fit_grid(&small_dataset(), &grid_2x3(), &mut store)
        .unwrap();

    assert_eq!(summary, GridSummary { fitted: 5, skipped: 1 });
    assert_eq!(std::fs::read(store.grid_path(Channel::U, 0)).unwrap(), b"existing");
    assert_ne!(std::fs::read(store.grid_path(Channel::U, 1)).unwrap(), b"existing");
}

#[test]
fn test_without_resume_existing_artifacts_are_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ModelStore::create(dir.path()).unwrap();
    std::fs::write(store.grid_path(Channel::U, 0), b"existing").unwrap();
    std::fs::write(store.grid_path(Channel::V, 0), b"existing").unwrap();

    let summary = ModelFitter::new(MeanRegressor)
        .fit_grid(&small_dataset(), &grid_2x3(), &mut store)
        .unwrap();
    assert_eq!(summary.fitted, 6);
    assert_ne!(std::fs::read(store.grid_path(Channel::U, 0)).unwrap(), b"existing");
}

#[test]
fn test_store_in_blocked_location_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();

    let err = ModelStore::create(&blocker.join("models")).unwrap_err();
    assert!(matches!(err, PersistError::CreateDir { .. }));
    assert!(Error::from(err).is_fatal());
}

// ---------------------------------------------------------------------------
// Svr
// ---------------------------------------------------------------------------

#[test]
fn test_kernel_width_scale_heuristic() {
    let x = Array2::from_shape_vec((2, 2), vec![0.0, 2.0, 0.0, 2.0]).unwrap();
    // var = 1, n_features = 2.
    assert!((Svr::kernel_width(&x) - 2.0).abs() < 1e-12);

    let constant = Array2::from_elem((3, 4), 0.7);
    assert_eq!(Svr::kernel_width(&constant), 1.0);
}

#[test]
fn test_kernel_width_falls_back_for_constant_features() {
    for value in [0.1, 0.7, 1.0 / 3.0, 123.456, -2.5e-3] {
        let constant = Array2::from_elem((7, 5), value);
        assert_eq!(Svr::kernel_width(&constant), 1.0, "value {value}");
    }
    assert_eq!(Svr::kernel_width(&Array2::zeros((0, 3))), 1.0);

    // Tiny spread relative to the magnitude counts as constant too.
    let mut nearly = Array2::from_elem((2, 2), 1.0e6);
    nearly[[0, 0]] += 1.0e-9;
    assert_eq!(Svr::kernel_width(&nearly), 1.0);
}

#[test]
fn test_svr_fits_smooth_target() {
    let mut ds = Dataset::new(2);
    for i in 0..6 {
        for j in 0..6 {
            let (a, b) = (i as f64 / 5.0, j as f64 / 5.0);
            ds.push(&[a, b], a - b + 1.0, 0.5 * a).unwrap();
        }
    }

    let pair = ModelFitter::new(Svr)
        .fit_pair(&ds, SvrParams { c: 1.0, epsilon: 0.01 })
        .unwrap();

    let x = ds.feature_matrix();
    let predicted: Array1<f64> = pair.u.predict(&x);
    assert_eq!(predicted.len(), ds.len());
    assert!(predicted.iter().all(|p| p.is_finite()));
    let mae = predicted
        .iter()
        .zip(ds.u())
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / ds.len() as f64;
    assert!(mae < 0.2, "mae {mae}");

    let json = serde_json::to_string(&pair.v).unwrap();
    assert!(!json.is_empty());
}
