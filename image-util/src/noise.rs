//! Noise realizations for simulated images.
//!
//! Two additive components are provided, each returned as a zero-mean field
//! the same shape as the image it describes:
//! - background: uncorrelated Gaussian noise with a fixed sigma
//! - shot noise: Gaussian approximation of Poisson arrival statistics with
//!   per-pixel sigma `sqrt(|pixel| / exposure_time)`
//!
//! Randomness always comes from the caller: either an `Rng` handle or a seed
//! for the parallel variants. To get a noisy image,
//! `image + gaussian_background(..) + poisson_noise(..)`, or use
//! [`NoiseModel::realize`].

use ndarray::{s, Array2, ArrayView2, Zip};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{ImageUtilError, Result};
use crate::parallel::process_array_in_parallel_chunks;

/// Zero-mean Gaussian field with standard deviation `sigma`, shaped like `image`.
pub fn gaussian_background<R: Rng + ?Sized>(
    image: &ArrayView2<f64>,
    sigma: f64,
    rng: &mut R,
) -> Array2<f64> {
    Array2::from_shape_fn(image.dim(), |_| {
        let z: f64 = StandardNormal.sample(rng);
        z * sigma
    })
}

/// Gaussian approximation of shot noise for `image`, in counts per unit
/// exposure time.
///
/// `exposure_time` must be positive; this is not checked and a zero or
/// negative value yields infinite or NaN sigmas.
pub fn poisson_noise<R: Rng + ?Sized>(
    image: &ArrayView2<f64>,
    exposure_time: f64,
    rng: &mut R,
) -> Array2<f64> {
    image.mapv(|pixel| {
        let z: f64 = StandardNormal.sample(rng);
        z * shot_sigma(pixel, exposure_time)
    })
}

fn shot_sigma(pixel: f64, exposure_time: f64) -> f64 {
    (pixel.abs() / exposure_time).sqrt()
}

/// [`gaussian_background`] generated in parallel row chunks.
///
/// Deterministic for a given `seed`, independent of the thread count.
pub fn gaussian_background_seeded(image: &ArrayView2<f64>, sigma: f64, seed: u64) -> Array2<f64> {
    process_array_in_parallel_chunks(Array2::zeros(image.dim()), seed, None, |_, chunk, rng| {
        chunk.iter_mut().for_each(|pixel| {
            let z: f64 = StandardNormal.sample(rng);
            *pixel = z * sigma;
        });
    })
}

/// [`poisson_noise`] generated in parallel row chunks.
pub fn poisson_noise_seeded(image: &ArrayView2<f64>, exposure_time: f64, seed: u64) -> Array2<f64> {
    process_array_in_parallel_chunks(Array2::zeros(image.dim()), seed, None, |row0, chunk, rng| {
        let rows = chunk.nrows();
        let source = image.slice(s![row0..row0 + rows, ..]);
        Zip::from(chunk).and(&source).for_each(|out, &pixel| {
            let z: f64 = StandardNormal.sample(rng);
            *out = z * shot_sigma(pixel, exposure_time);
        });
    })
}

/// Noise settings for turning a model image into a mock observation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Background sigma per pixel
    #[serde(default)]
    pub background_sigma: f64,
    /// Exposure time for shot noise; no shot noise when absent
    #[serde(default)]
    pub exposure_time: Option<f64>,
}

impl NoiseModel {
    /// Check that the parameters describe a realizable noise model.
    pub fn validate(&self) -> Result<()> {
        if !self.background_sigma.is_finite() || self.background_sigma < 0.0 {
            return Err(ImageUtilError::InvalidParameter(format!(
                "background sigma must be finite and non-negative, got {}",
                self.background_sigma
            )));
        }
        if let Some(t) = self.exposure_time {
            if !t.is_finite() || t <= 0.0 {
                return Err(ImageUtilError::InvalidParameter(format!(
                    "exposure time must be positive, got {t}"
                )));
            }
        }
        Ok(())
    }

    /// `image` plus one background and one shot noise realization.
    pub fn realize<R: Rng + ?Sized>(&self, image: &ArrayView2<f64>, rng: &mut R) -> Result<Array2<f64>> {
        self.validate()?;
        let mut noisy = image.to_owned();
        if self.background_sigma > 0.0 {
            noisy += &gaussian_background(image, self.background_sigma, rng);
        }
        if let Some(exposure_time) = self.exposure_time {
            noisy += &poisson_noise(image, exposure_time, rng);
        }
        Ok(noisy)
    }
}
