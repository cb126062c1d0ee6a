use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use tracing::{debug, info};

use crate::data::provider::DatasetProvider;
use crate::data::sample::Sample;
use crate::error::{Error, Result};

/// Subdirectory holding lesion images (label `1.0`).
pub const POSITIVE_DIR: &str = "malignant";
/// Subdirectory holding non-lesion images (label `0.0`).
pub const NEGATIVE_DIR: &str = "benign";

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Loads labelled images from `<root>/malignant` and `<root>/benign`.
///
/// Each image is converted to 8-bit grayscale and resized to exactly
/// `width × length`; features are the raw intensities. Files are taken in
/// name order per class and the classes are interleaved, malignant first,
/// so contiguous slices hold both labels.
pub struct ImageFolderProvider {
    root: PathBuf,
}

impl ImageFolderProvider {
    pub fn new(root: impl Into<PathBuf>) -> ImageFolderProvider {
        ImageFolderProvider { root: root.into() }
    }

    fn list(&self, dir: &str) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(dir);
        let mut files = std::fs::read_dir(&dir)
            .map_err(|e| Error::Dataset(format!("cannot read {}: {e}", dir.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect::<Vec<_>>();
        files.sort();
        Ok(files)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads one image as `length × width` grayscale intensities in `0..=255`.
pub fn load_grayscale(path: &Path, length: usize, width: usize) -> Result<Vec<f64>> {
    let img = image::open(path)?;
    let resized = img.resize_exact(width as u32, length as u32, FilterType::Triangle);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| p.0[0] as f64).collect())
}

fn interleave(positives: Vec<PathBuf>, negatives: Vec<PathBuf>) -> Vec<(f64, PathBuf)> {
    let mut out = Vec::with_capacity(positives.len() + negatives.len());
    let mut pos = positives.into_iter();
    let mut neg = negatives.into_iter();
    loop {
        match (pos.next(), neg.next()) {
            (None, None) => break,
            (p, n) => {
                out.extend(p.map(|p| (1.0, p)));
                out.extend(n.map(|n| (0.0, n)));
            }
        }
    }
    out
}

impl DatasetProvider for ImageFolderProvider {
    fn generate(&mut self, length: usize, width: usize, count: usize) -> Result<Vec<Sample>> {
        let files = interleave(self.list(POSITIVE_DIR)?, self.list(NEGATIVE_DIR)?);
        if files.len() < count {
            return Err(Error::Dataset(format!(
                "{} holds {} images, {count} requested",
                self.root.display(),
                files.len()
            )));
        }
        info!(root = %self.root.display(), count, "loading images");
        files
            .into_iter()
            .take(count)
            .map(|(label, path)| -> Result<Sample> {
                let features = load_grayscale(&path, length, width)?;
                let id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                debug!(%id, label, "loaded");
                Ok(Sample::new(label, features, id))
            })
            .collect()
    }
}
