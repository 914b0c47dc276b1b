//! RGB to YUV conversion.

use crate::raster::{Image, Plane};

/// RGB → YUV matrix. Row `c` holds the weights of output channel `c`, so
/// `yuv = M · rgb` per pixel (equivalently `rgb_row · Mᵀ` for a pixel row vector).
pub const YUV_FROM_RGB: [[f64; 3]; 3] = [
    [0.299, 0.587, 0.114],
    [-0.14713, -0.28886, 0.436],
    [0.615, -0.51499, -0.10001],
];

/// Luma/chroma planes of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct YuvImage {
    pub y: Plane<f64>,
    pub u: Plane<f64>,
    pub v: Plane<f64>,
}

impl YuvImage {
    #[inline]
    pub fn width(&self) -> usize {
        self.y.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.y.height()
    }
}

#[inline]
pub fn rgb_to_yuv(rgb: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (c, weights) in YUV_FROM_RGB.iter().enumerate() {
        out[c] = weights[0] * rgb[0] + weights[1] * rgb[1] + weights[2] * rgb[2];
    }
    out
}

/// D65 reference white in XYZ.
const D65_WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];

/// sRGB (gamma-encoded, `[0, 1]`) to CIELAB under D65.
pub fn srgb_to_lab(rgb: [f64; 3]) -> [f64; 3] {
    fn linearize(c: f64) -> f64 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    fn f(t: f64) -> f64 {
        const DELTA: f64 = 6.0 / 29.0;
        if t > DELTA * DELTA * DELTA {
            t.cbrt()
        } else {
            t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
        }
    }

    let [r, g, b] = rgb.map(linearize);
    let x = 0.412453 * r + 0.357580 * g + 0.180423 * b;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = 0.019334 * r + 0.119193 * g + 0.950227 * b;

    let fx = f(x / D65_WHITE[0]);
    let fy = f(y / D65_WHITE[1]);
    let fz = f(z / D65_WHITE[2]);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Convert an image to YUV planes.
///
/// Grayscale images carry no chrominance: luma is the sample itself and U/V are zero.
pub fn to_yuv(image: &Image) -> YuvImage {
    let width = image.width();
    let height = image.height();
    let pixel_count = width * height;

    let mut y = Vec::with_capacity(pixel_count);
    let mut u = Vec::with_capacity(pixel_count);
    let mut v = Vec::with_capacity(pixel_count);

    if image.dimensions().is_grayscale() {
        y.extend(image.samples().iter().map(|&s| s as f64));
        u.resize(pixel_count, 0.0);
        v.resize(pixel_count, 0.0);
    } else {
        for px in image.samples().chunks_exact(image.channels()) {
            let [py, pu, pv] = rgb_to_yuv([px[0] as f64, px[1] as f64, px[2] as f64]);
            y.push(py);
            u.push(pu);
            v.push(pv);
        }
    }

    YuvImage {
        y: Plane::new(width, height, y),
        u: Plane::new(width, height, u),
        v: Plane::new(width, height, v),
    }
}
