//! Per-superpixel statistics: pixel count, centroid and mean chrominance.


use thiserror::Error;

use crate::color::YuvImage;
use crate::segmentation::SegmentLabels;

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Label array is {labels_width}x{labels_height} but image is {image_width}x{image_height}")]
    ShapeMismatch {
        labels_width: usize,
        labels_height: usize,
        image_width: usize,
        image_height: usize,
    },
}

/// Mean `(row, col)` position of a segment's pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub row: f64,
    pub col: f64,
}

/// Statistics of a segment with at least one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    pub centroid: Centroid,
    pub mean_u: f64,
    pub mean_v: f64,
}

/// Aggregate for one segment label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRecord {
    pub point_count: usize,
    /// `None` when the label has no pixels; such a record must not be used.
    pub stats: Option<RegionStats>,
}

impl RegionRecord {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }
}

/// Aggregate `yuv` over `labels`.
///
/// Returns one record per label in `0..labels.n_segments()`. Labels that no pixel
/// carries (sparse numbering) get `point_count == 0` and `stats == None`.
pub fn aggregate(yuv: &YuvImage, labels: &SegmentLabels) -> Result<Vec<RegionRecord>, RegionError> {
    if labels.width() != yuv.width() || labels.height() != yuv.height() {
        return Err(RegionError::ShapeMismatch {
            labels_width: labels.width(),
            labels_height: labels.height(),
            image_width: yuv.width(),
            image_height: yuv.height(),
        });
    }

    let n_segments = labels.n_segments();
    let mut counts = vec![0usize; n_segments];
    let mut row_sums = vec![0.0f64; n_segments];
    let mut col_sums = vec![0.0f64; n_segments];
    let mut u_sums = vec![0.0f64; n_segments];
    let mut v_sums = vec![0.0f64; n_segments];

    for row in 0..labels.height() {
        for col in 0..labels.width() {
            let k = labels.get(row, col) as usize;
            counts[k] += 1;
            row_sums[k] += row as f64;
            col_sums[k] += col as f64;
            u_sums[k] += yuv.u[(row, col)];
            v_sums[k] += yuv.v[(row, col)];
        }
    }

    let records = (0..n_segments)
        .map(|k| {
            let point_count = counts[k];
            let stats = (point_count > 0).then(|| {
                let n = point_count as f64;
                RegionStats {
                    centroid: Centroid {
                        row: row_sums[k] / n,
                        col: col_sums[k] / n,
                    },
                    mean_u: u_sums[k] / n,
                    mean_v: v_sums[k] / n,
                }
            });
            RegionRecord { point_count, stats }
        })
        .collect();

    Ok(records)
}
