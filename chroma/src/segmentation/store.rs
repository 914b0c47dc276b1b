use std::path::{Path, PathBuf};

use crate::cache::DiskCache;
use crate::error::Error;
use crate::raster::Image;

use super::{LabelCodec, SegmentLabels, SegmentationError, Segmenter};

/// A decoded image with its (possibly cached) superpixel labels.
#[derive(Debug, Clone)]
pub struct SegmentedImage {
    pub image: Image,
    pub labels: SegmentLabels,
    /// True if the labels were loaded from the segmentation cache.
    pub cache_hit: bool,
}

/// Outcome of [`SegmentationStore::segment_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentationSummary {
    pub computed: usize,
    pub cached: usize,
    pub failed: usize,
}

/// Disk-memoized segmentation keyed by (source path, target segment count).
#[derive(Debug)]
pub struct SegmentationStore<S> {
    segmenter: S,
    cache: DiskCache<LabelCodec>,
    n_segments: usize,
    cache_dir: Option<PathBuf>,
}

impl<S: Segmenter> SegmentationStore<S> {
    pub fn new(segmenter: S, n_segments: usize, cache_dir: Option<PathBuf>) -> Self {
        Self {
            segmenter,
            cache: DiskCache::new(LabelCodec),
            n_segments,
            cache_dir,
        }
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    /// Cache file for `source`.
    ///
    /// Without a cache directory this is `{source}.{n}.segments` beside the image.
    /// With one, `{cache_dir}/{file_name}.{path_hash:016x}.{n}.segments`, where the
    /// hash of the full source path keeps same-named files in different folders apart.
    pub fn cache_path(&self, source: &Path) -> PathBuf {
        match &self.cache_dir {
            None => {
                let mut name = source.as_os_str().to_owned();
                name.push(format!(".{}.segments", self.n_segments));
                PathBuf::from(name)
            }
            Some(dir) => {
                let file_name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                dir.join(format!(
                    "{}.{:016x}.{}.segments",
                    file_name,
                    common::stable_path_hash(source),
                    self.n_segments
                ))
            }
        }
    }

    /// Decode `path` and return its labels, segmenting only on a cache miss.
    ///
    /// A cached entry whose shape does not match the decoded image is treated as
    /// stale and replaced.
    pub fn load(&self, path: &Path) -> Result<SegmentedImage, Error> {
        let image = Image::from_file(path)?;
        let cache_path = self.cache_path(path);

        let cached = self
            .cache
            .get_or_compute(&cache_path, || self.compute(&image, path))?;

        let (labels, cache_hit) = if matches_image(&cached.value, &image) {
            (cached.value, cached.hit)
        } else {
            tracing::warn!(
                path = %cache_path.display(),
                cached_width = cached.value.width(),
                cached_height = cached.value.height(),
                width = image.width(),
                height = image.height(),
                "Cached segmentation does not match image shape, recomputing"
            );
            let labels = self.compute(&image, path)?;
            self.cache.store(&cache_path, &labels)?;
            (labels, false)
        };

        Ok(SegmentedImage {
            image,
            labels,
            cache_hit,
        })
    }

    /// Warm the cache for every image under `dir`. Per-image failures are logged
    /// and counted; only fatal errors abort.
    pub fn segment_all(
        &self,
        dir: &Path,
        extensions: &[String],
    ) -> Result<SegmentationSummary, Error> {
        let mut summary = SegmentationSummary::default();

        for path in common::walk_files_with_extensions(dir, extensions) {
            match self.load(&path) {
                Ok(segmented) if segmented.cache_hit => summary.cached += 1,
                Ok(_) => summary.computed += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping image");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            computed = summary.computed,
            cached = summary.cached,
            failed = summary.failed,
            "Segmentation pass finished"
        );
        Ok(summary)
    }

    fn compute(&self, image: &Image, path: &Path) -> Result<SegmentLabels, Error> {
        tracing::info!(path = %path.display(), n_segments = self.n_segments, "Segmenting");
        let labels = self.segmenter.segment(image, self.n_segments)?;
        if !matches_image(&labels, image) {
            return Err(SegmentationError::LabelCount {
                width: image.width(),
                height: image.height(),
                expected: image.width() * image.height(),
                actual: labels.as_slice().len(),
            }
            .into());
        }
        Ok(labels)
    }
}

fn matches_image(labels: &SegmentLabels, image: &Image) -> bool {
    labels.width() == image.width() && labels.height() == image.height()
}
