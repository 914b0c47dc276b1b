use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::color;
use crate::config::Config;
use crate::error::Error;
use crate::features::PatchEncoder;
use crate::segmentation::{SegmentationStore, Segmenter};

use super::{Dataset, extract_samples};

/// Samples contributed by one image.
#[derive(Debug, Clone)]
pub struct ImageSamples {
    pub path: PathBuf,
    pub samples: Dataset,
    /// Segments without pixels, skipped.
    pub empty_segments: usize,
    pub cache_hit: bool,
}

/// Counters of one [`DatasetAssembler::assemble`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblySummary {
    pub images: usize,
    pub skipped: usize,
    pub cache_hits: usize,
    pub rows: usize,
}

/// Walks an image tree and builds the global [`Dataset`].
///
/// Images are processed in parallel, at most `max_concurrent_images` at a time.
/// Per-image results are merged on the calling thread in sorted path order, so the
/// row order depends only on the set of files.
#[derive(Debug)]
pub struct DatasetAssembler<S> {
    store: SegmentationStore<S>,
    encoder: PatchEncoder,
    extensions: Vec<String>,
    max_concurrent_images: usize,
}

impl<S: Segmenter> DatasetAssembler<S> {
    pub fn new(config: &Config, segmenter: S) -> Result<Self, Error> {
        config.validate()?;
        let store = SegmentationStore::new(segmenter, config.n_segments, config.cache_dir.clone());
        let encoder = PatchEncoder::new(config.patch_side, config.centroid_rounding)?;
        Ok(Self {
            store,
            encoder,
            extensions: config.image_extensions.clone(),
            max_concurrent_images: config.max_concurrent_images.max(1),
        })
    }

    pub fn store(&self) -> &SegmentationStore<S> {
        &self.store
    }

    pub fn encoder(&self) -> &PatchEncoder {
        &self.encoder
    }

    /// Decode, segment (cached) and encode a single image.
    pub fn process_image(&self, path: &Path) -> Result<ImageSamples, Error> {
        let segmented = self.store.load(path)?;
        let yuv = color::to_yuv(&segmented.image);
        drop(segmented.image);

        let samples = extract_samples(&yuv, &segmented.labels, &self.encoder)?;
        let empty_segments = segmented.labels.n_segments() - samples.len();

        tracing::debug!(
            path = %path.display(),
            rows = samples.len(),
            empty_segments,
            cache_hit = segmented.cache_hit,
            "Extracted samples"
        );

        Ok(ImageSamples {
            path: path.to_path_buf(),
            samples,
            empty_segments,
            cache_hit: segmented.cache_hit,
        })
    }

    pub fn assemble(&self, dir: &Path) -> Result<Dataset, Error> {
        self.assemble_with_summary(dir).map(|(dataset, _)| dataset)
    }

    /// Like [`assemble`](Self::assemble), also returning run counters.
    ///
    /// Images that fail to decode, segment or encode are logged and skipped. Fatal
    /// errors (see [`Error::is_fatal`]) abort the run.
    pub fn assemble_with_summary(&self, dir: &Path) -> Result<(Dataset, AssemblySummary), Error> {
        let paths = common::walk_files_with_extensions(dir, &self.extensions);
        tracing::info!(dir = %dir.display(), images = paths.len(), "Assembling dataset");

        let mut dataset = Dataset::new(self.encoder.feature_len());
        let mut summary = AssemblySummary::default();

        for chunk in paths.chunks(self.max_concurrent_images) {
            let results: Vec<Result<ImageSamples, Error>> =
                chunk.par_iter().map(|path| self.process_image(path)).collect();

            for (path, result) in chunk.iter().zip(results) {
                match result {
                    Ok(image) => {
                        summary.images += 1;
                        summary.cache_hits += usize::from(image.cache_hit);
                        dataset.append(image.samples)?;
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping image");
                        summary.skipped += 1;
                    }
                }
            }
        }

        summary.rows = dataset.len();
        tracing::info!(
            images = summary.images,
            skipped = summary.skipped,
            cache_hits = summary.cache_hits,
            rows = summary.rows,
            "Dataset assembled"
        );
        Ok((dataset, summary))
    }
}
