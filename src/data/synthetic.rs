use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::provider::DatasetProvider;
use crate::data::sample::Sample;
use crate::error::Result;

/// Generates grayscale "skin patch" images: every even-indexed sample is a
/// lesion (bright blob centred in the image), every odd one is background
/// noise only. Deterministic for a given seed.
pub struct SyntheticProvider {
    rng: StdRng,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> SyntheticProvider {
        SyntheticProvider { rng: StdRng::seed_from_u64(seed) }
    }

    fn image(&mut self, length: usize, width: usize, lesion: bool) -> Vec<f64> {
        let (cy, cx) = ((length as f64 - 1.0) / 2.0, (width as f64 - 1.0) / 2.0);
        let radius = length.min(width) as f64 / 2.5;
        let mut pixels = Vec::with_capacity(length * width);
        for y in 0..length {
            for x in 0..width {
                let inside = ((y as f64 - cy).powi(2) + (x as f64 - cx).powi(2)).sqrt() <= radius;
                let value = if lesion && inside {
                    self.rng.gen_range(190.0..=255.0)
                } else {
                    self.rng.gen_range(40.0..=110.0)
                };
                pixels.push(f64::round(value));
            }
        }
        pixels
    }
}

impl DatasetProvider for SyntheticProvider {
    fn generate(&mut self, length: usize, width: usize, count: usize) -> Result<Vec<Sample>> {
        Ok((0..count)
            .map(|i| {
                let lesion = i % 2 == 0;
                let features = self.image(length, width, lesion);
                Sample::new(if lesion { 1.0 } else { 0.0 }, features, format!("synthetic-{i:04}"))
            })
            .collect())
    }
}
