use std::io::{self, Write};

use crate::cache::CacheCodec;
use crate::segmentation::SegmentationError;

/// Per-pixel segment labels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLabels {
    width: usize,
    height: usize,
    labels: Vec<u32>,
}

impl SegmentLabels {
    /// Wrap a row-major label array.
    ///
    /// Every label must be below `width * height`: a partition never has more
    /// segments than pixels.
    pub fn from_raw(
        width: usize,
        height: usize,
        labels: Vec<u32>,
    ) -> Result<Self, SegmentationError> {
        if labels.len() != width * height {
            return Err(SegmentationError::LabelCount {
                width,
                height,
                expected: width * height,
                actual: labels.len(),
            });
        }
        let pixel_count = labels.len();
        if let Some((index, &label)) = labels
            .iter()
            .enumerate()
            .find(|&(_, &label)| label as usize >= pixel_count)
        {
            return Err(SegmentationError::LabelOutOfRange {
                label,
                index,
                pixel_count,
            });
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        debug_assert!(row < self.height && col < self.width);
        self.labels[row * self.width + col]
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.labels
    }

    /// `max(label) + 1`, or 0 for an empty array.
    pub fn n_segments(&self) -> usize {
        self.labels
            .iter()
            .max()
            .map_or(0, |&max| max as usize + 1)
    }
}

const MAGIC: &[u8; 4] = b"SLBL";
const VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

/// Binary cache format for [`SegmentLabels`].
///
/// Layout (little-endian): magic `SLBL`, version `u32`, width `u32`, height `u32`,
/// then `width * height` labels as `u32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelCodec;

impl CacheCodec for LabelCodec {
    type Value = SegmentLabels;

    fn encode(&self, value: &SegmentLabels, writer: &mut dyn Write) -> io::Result<()> {
        let dim = |v: usize| {
            u32::try_from(v).map_err(|_| io::Error::other(format!("dimension {} too large", v)))
        };

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&dim(value.width)?.to_le_bytes())?;
        writer.write_all(&dim(value.height)?.to_le_bytes())?;
        for label in &value.labels {
            writer.write_all(&label.to_le_bytes())?;
        }
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<SegmentLabels, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!("file too short: {} bytes", bytes.len()));
        }
        if &bytes[0..4] != MAGIC {
            return Err("bad magic".to_string());
        }

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        let version = read_u32(4);
        if version != VERSION {
            return Err(format!("unsupported version {}", version));
        }
        let width = read_u32(8) as usize;
        let height = read_u32(12) as usize;

        let body = &bytes[HEADER_LEN..];
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| format!("dimensions {}x{} overflow", width, height))?;
        if body.len() != expected {
            return Err(format!(
                "expected {} label bytes for {}x{}, found {}",
                expected,
                width,
                height,
                body.len()
            ));
        }

        let labels = body
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        SegmentLabels::from_raw(width, height, labels).map_err(|e| e.to_string())
    }
}
