//! SLIC superpixels (simple linear iterative clustering).
//!
//! K-means in a joint (color, position) space, restricted to a window of about
//! one grid step around each cluster center. RGB images are clustered in
//! CIELAB; grayscale images are clustered on raw intensity.

use crate::color::srgb_to_lab;
use crate::config::SegmentationParams;
use crate::raster::Image;

use super::{SegmentLabels, SegmentationError, Segmenter};

const UNSET: u32 = u32::MAX;

#[derive(Debug, Clone, Default)]
pub struct Slic {
    params: SegmentationParams,
}

#[derive(Debug, Clone, Copy)]
struct Center {
    color: [f64; 3],
    row: f64,
    col: f64,
}

impl Slic {
    pub fn new(params: SegmentationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SegmentationParams {
        &self.params
    }

    /// Smoothed per-pixel clustering features. Unused components stay zero.
    fn color_features(&self, image: &Image) -> Result<Vec<[f64; 3]>, SegmentationError> {
        let width = image.width();
        let height = image.height();
        let channels = image.channels();
        if channels != 1 && channels != 3 {
            return Err(SegmentationError::UnsupportedChannels(channels));
        }

        let planes: Vec<Vec<f64>> = (0..channels)
            .map(|c| {
                let plane: Vec<f64> = image.channel(c).data().iter().map(|&s| s as f64).collect();
                if self.params.sigma > 0.0 {
                    gaussian_blur(&plane, width, height, self.params.sigma)
                } else {
                    plane
                }
            })
            .collect();

        let features = (0..width * height)
            .map(|idx| {
                if channels == 3 {
                    srgb_to_lab([planes[0][idx], planes[1][idx], planes[2][idx]])
                } else {
                    [planes[0][idx], 0.0, 0.0]
                }
            })
            .collect();

        Ok(features)
    }
}

impl Segmenter for Slic {
    fn segment(
        &self,
        image: &Image,
        n_segments: usize,
    ) -> Result<SegmentLabels, SegmentationError> {
        let width = image.width();
        let height = image.height();
        if width == 0 || height == 0 {
            return Err(SegmentationError::EmptyImage);
        }
        if n_segments == 0 {
            return Err(SegmentationError::ZeroSegments);
        }

        let features = self.color_features(image)?;
        let pixel_count = width * height;
        let step = (pixel_count as f64 / n_segments as f64).sqrt().max(1.0);

        let (mut centers, mut labels) = grid_init(&features, width, height, step);
        let spatial_weight = (self.params.compactness / step).powi(2);
        let radius = step.ceil();
        let mut distances = vec![f64::INFINITY; pixel_count];

        for _ in 0..self.params.max_iterations {
            distances.fill(f64::INFINITY);

            for (k, center) in centers.iter().enumerate() {
                let r0 = (center.row - radius).max(0.0) as usize;
                let r1 = ((center.row + radius) as usize).min(height - 1);
                let c0 = (center.col - radius).max(0.0) as usize;
                let c1 = ((center.col + radius) as usize).min(width - 1);

                for row in r0..=r1 {
                    for col in c0..=c1 {
                        let idx = row * width + col;
                        let color = &features[idx];
                        let dc = (0..3)
                            .map(|i| (color[i] - center.color[i]).powi(2))
                            .sum::<f64>();
                        let ds = (row as f64 - center.row).powi(2)
                            + (col as f64 - center.col).powi(2);
                        let d = dc + ds * spatial_weight;
                        if d < distances[idx] {
                            distances[idx] = d;
                            labels[idx] = k as u32;
                        }
                    }
                }
            }

            update_centers(&mut centers, &labels, &features, width);
        }

        let labels = if self.params.enforce_connectivity {
            let min_size =
                (self.params.min_size_factor * pixel_count as f64 / n_segments as f64) as usize;
            enforce_connectivity(&labels, width, height, min_size)
        } else {
            relabel_dense(&labels)
        };

        tracing::debug!(
            width,
            height,
            target = n_segments,
            actual = labels.iter().max().map_or(0, |&m| m as usize + 1),
            "SLIC segmentation done"
        );

        SegmentLabels::from_raw(width, height, labels)
    }
}

/// Regular grid of centers with roughly `step` pixel spacing, plus the grid-cell
/// label of every pixel (used where no center window reaches).
fn grid_init(
    features: &[[f64; 3]],
    width: usize,
    height: usize,
    step: f64,
) -> (Vec<Center>, Vec<u32>) {
    let grid_rows = ((height as f64 / step).round() as usize).clamp(1, height);
    let grid_cols = ((width as f64 / step).round() as usize).clamp(1, width);
    let cell_h = height as f64 / grid_rows as f64;
    let cell_w = width as f64 / grid_cols as f64;

    let mut centers = Vec::with_capacity(grid_rows * grid_cols);
    for gr in 0..grid_rows {
        for gc in 0..grid_cols {
            let row = (gr as f64 + 0.5) * cell_h;
            let col = (gc as f64 + 0.5) * cell_w;
            let idx = (row as usize).min(height - 1) * width + (col as usize).min(width - 1);
            centers.push(Center {
                color: features[idx],
                row,
                col,
            });
        }
    }

    let mut labels = Vec::with_capacity(width * height);
    for row in 0..height {
        let gr = ((row as f64 / cell_h) as usize).min(grid_rows - 1);
        for col in 0..width {
            let gc = ((col as f64 / cell_w) as usize).min(grid_cols - 1);
            labels.push((gr * grid_cols + gc) as u32);
        }
    }

    (centers, labels)
}

/// Move each center to the mean color/position of its pixels. Empty clusters stay put.
fn update_centers(centers: &mut [Center], labels: &[u32], features: &[[f64; 3]], width: usize) {
    let mut sums = vec![([0.0f64; 3], 0.0f64, 0.0f64, 0usize); centers.len()];

    for (idx, &label) in labels.iter().enumerate() {
        let entry = &mut sums[label as usize];
        for i in 0..3 {
            entry.0[i] += features[idx][i];
        }
        entry.1 += (idx / width) as f64;
        entry.2 += (idx % width) as f64;
        entry.3 += 1;
    }

    for (center, (color, row, col, count)) in centers.iter_mut().zip(sums) {
        if count == 0 {
            continue;
        }
        let n = count as f64;
        center.color = color.map(|c| c / n);
        center.row = row / n;
        center.col = col / n;
    }
}

/// Split labels into 4-connected components, merge components smaller than
/// `min_size` into the neighbor preceding them in raster order, and number the
/// result densely from 0 in raster order.
fn enforce_connectivity(labels: &[u32], width: usize, height: usize, min_size: usize) -> Vec<u32> {
    let mut out = vec![UNSET; labels.len()];
    let mut next = 0u32;
    let mut stack = Vec::new();
    let mut component = Vec::new();

    for start in 0..labels.len() {
        if out[start] != UNSET {
            continue;
        }

        let row = start / width;
        let col = start % width;
        // Every pixel before `start` in raster order is already labelled.
        let adjacent = if col > 0 {
            Some(out[start - 1])
        } else if row > 0 {
            Some(out[start - width])
        } else {
            None
        };

        let original = labels[start];
        component.clear();
        out[start] = next;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            component.push(idx);
            let r = idx / width;
            let c = idx % width;
            let mut visit = |nb: usize| {
                if out[nb] == UNSET && labels[nb] == original {
                    out[nb] = next;
                    stack.push(nb);
                }
            };
            if c > 0 {
                visit(idx - 1);
            }
            if c + 1 < width {
                visit(idx + 1);
            }
            if r > 0 {
                visit(idx - width);
            }
            if r + 1 < height {
                visit(idx + width);
            }
        }

        if component.len() < min_size {
            if let Some(adjacent) = adjacent {
                for &idx in &component {
                    out[idx] = adjacent;
                }
                continue;
            }
        }
        next += 1;
    }

    out
}

/// Renumber labels densely from 0 in order of first appearance.
fn relabel_dense(labels: &[u32]) -> Vec<u32> {
    let max = labels.iter().max().map_or(0, |&m| m as usize);
    let mut mapping = vec![UNSET; max + 1];
    let mut next = 0u32;

    labels
        .iter()
        .map(|&label| {
            let slot = &mut mapping[label as usize];
            if *slot == UNSET {
                *slot = next;
                next += 1;
            }
            *slot
        })
        .collect()
}

/// Separable Gaussian blur with reflected borders (`d c b a | a b c d | d c b a`).
/// The kernel is truncated at four standard deviations.
fn gaussian_blur(data: &[f64], width: usize, height: usize, sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-(x * x) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= norm);

    let mut tmp = vec![0.0; data.len()];
    for row in 0..height {
        let line = &data[row * width..(row + 1) * width];
        for col in 0..width {
            tmp[row * width + col] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * line[reflect(col as isize + k as isize - radius, width)])
                .sum();
        }
    }

    let mut out = vec![0.0; data.len()];
    for row in 0..height {
        for col in 0..width {
            out[row * width + col] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let r = reflect(row as isize + k as isize - radius, height);
                    w * tmp[r * width + col]
                })
                .sum();
        }
    }
    out
}

#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let i = i.rem_euclid(2 * n);
    (if i >= n { 2 * n - 1 - i } else { i }) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_boundaries() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn test_blur_preserves_constant() {
        let data = vec![0.5; 6 * 5];
        let blurred = gaussian_blur(&data, 6, 5, 1.0);
        assert!(blurred.iter().all(|&v| (v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_relabel_dense_first_appearance() {
        assert_eq!(relabel_dense(&[7, 7, 3, 9, 3]), vec![0, 0, 1, 2, 1]);
    }

    #[test]
    fn test_enforce_connectivity_splits_disconnected_label() {
        // Label 0 appears in two disconnected pieces separated by label 1.
        let labels = [0, 1, 0, 0, 1, 0];
        let out = enforce_connectivity(&labels, 3, 2, 0);
        assert_eq!(out, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_enforce_connectivity_merges_small_fragment() {
        // A single stray pixel of label 1 inside label 0.
        #[rustfmt::skip]
        let labels = [
            0, 0, 0,
            0, 1, 0,
            0, 0, 0,
        ];
        let out = enforce_connectivity(&labels, 3, 3, 2);
        assert!(out.iter().all(|&l| l == 0));
    }
}
