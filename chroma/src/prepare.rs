//! Image preparation: canonical-size training images and grayscale test inputs.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::constants::JPEG_QUALITY;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeSummary {
    pub resized: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Resize every matching image under `dir` to `size` (width, height), in place.
///
/// Images already at `size` are left untouched. Resized images are re-encoded as
/// RGB JPEG and replace the original atomically. Per-file failures are logged.
pub fn resize_tree(dir: &Path, extensions: &[String], size: (u32, u32)) -> ResizeSummary {
    let mut summary = ResizeSummary::default();

    for path in common::walk_files_with_extensions(dir, extensions) {
        match resize_file(&path, size) {
            Ok(true) => summary.resized += 1,
            Ok(false) => summary.unchanged += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "Failed to resize");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        resized = summary.resized,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "Resize finished"
    );
    summary
}

/// Returns false if the image already had the requested size.
pub fn resize_file(path: &Path, (width, height): (u32, u32)) -> Result<bool> {
    let decoded = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if decoded.dimensions() == (width, height) {
        return Ok(false);
    }

    tracing::info!(path = %path.display(), width, height, "Resizing");
    let resized = decoded.to_rgb8();
    let resized = image::imageops::resize(&resized, width, height, FilterType::Lanczos3);
    write_jpeg(path, &DynamicImage::ImageRgb8(resized))?;
    Ok(true)
}

/// Write grayscale copies of up to `limit` images from `src` (non-recursive,
/// sorted by name) into `dst` as `test_{file_name}`. Returns the number written.
pub fn make_grayscale_set(src: &Path, dst: &Path, extensions: &[String], limit: usize) -> Result<usize> {
    std::fs::create_dir_all(dst).with_context(|| format!("Failed to create {}", dst.display()))?;

    let mut sources: Vec<_> = std::fs::read_dir(src)
        .with_context(|| format!("Failed to read {}", src.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && common::has_extension(path, extensions))
        .collect();
    sources.sort();

    let mut written = 0;
    for path in sources {
        if written >= limit {
            break;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let gray = match image::open(&path) {
            Ok(decoded) => decoded.to_luma8(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable image");
                continue;
            }
        };
        let out = dst.join(format!("test_{name}"));
        write_jpeg(&out, &DynamicImage::ImageLuma8(gray))?;
        written += 1;
    }

    tracing::info!(written, dst = %dst.display(), "Grayscale test images created");
    Ok(written)
}

fn write_jpeg(path: &Path, image: &DynamicImage) -> Result<()> {
    common::write_atomic(path, |w| {
        image
            .write_with_encoder(JpegEncoder::new_with_quality(w, JPEG_QUALITY))
            .map_err(io::Error::other)
    })
    .with_context(|| format!("Failed to write {}", path.display()))
}
