//! Default pipeline parameters.

/// Target number of superpixels per image.
pub const N_SEGMENTS: usize = 200;

/// Side length of the square luma patch sampled around each centroid.
pub const SQUARE_SIZE: usize = 10;

/// SVR regularization used when fitting a single model pair.
pub const C: f64 = 0.125;

/// SVR epsilon-tube width used when fitting a single model pair.
pub const SVR_EPSILON: f64 = 0.0625;

/// C values swept in grid mode (outer loop).
pub const C_LIST: &[f64] = &[0.0625, 0.125, 0.25, 0.5, 1.0];

/// Epsilon values swept in grid mode (inner loop).
pub const EPSILON_LIST: &[f64] = &[0.0625, 0.125, 0.25];

/// SLIC compactness: balances color proximity against spatial proximity.
pub const SLIC_COMPACTNESS: f64 = 10.0;

/// Gaussian pre-smoothing applied before SLIC clustering.
pub const SLIC_SIGMA: f64 = 1.0;

/// Maximum number of k-means iterations in SLIC.
pub const SLIC_MAX_ITERATIONS: usize = 10;

/// Fragments smaller than this fraction of the nominal segment size are merged.
pub const SLIC_MIN_SIZE_FACTOR: f64 = 0.5;

/// Images processed in flight at once by the dataset assembler.
pub const MAX_CONCURRENT_IMAGES: usize = 8;

/// Canonical training image size (width, height).
pub const DESIRED_SIZE: (u32, u32) = (500, 500);

/// JPEG quality used when re-encoding resized images.
pub const JPEG_QUALITY: u8 = 95;
