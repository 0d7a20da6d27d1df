//! Weighted co-addition of registered exposures.

use ndarray::{Array2, Zip};

use crate::error::{ImageUtilError, Result};
use crate::shape::GridShape;
use crate::stats::median;

/// Result of [`stack_images`]
#[derive(Debug, Clone, PartialEq)]
pub struct StackedImage {
    /// Weighted mean image, `sum(image_i * weight_i) / sum(weight_i)`
    pub image: Array2<f64>,
    /// Per-pixel sum of the input weight maps
    pub weight_sum: Array2<f64>,
    /// Combined background sigma
    pub sigma: f64,
    /// Number of stacked exposures
    pub count: usize,
}

impl StackedImage {
    /// Weight map averaged over the inputs
    pub fn mean_weight(&self) -> Array2<f64> {
        &self.weight_sum / self.count as f64
    }
}

/// Stack `images` with per-pixel `weights` and scalar background `sigmas`.
///
/// Each sigma enters in quadrature weighted by the median of its own weight
/// map; the total is normalized by the median of the summed weight map.
/// Pixels whose weights sum to zero come out non-finite.
///
/// # Errors
/// `EmptyInput` for no images; `ShapeMismatch` when the three sequences
/// differ in length or any image or weight map differs in shape from the
/// first image.
pub fn stack_images(
    images: &[Array2<f64>],
    weights: &[Array2<f64>],
    sigmas: &[f64],
) -> Result<StackedImage> {
    let Some(first) = images.first() else {
        return Err(ImageUtilError::EmptyInput("no images to stack"));
    };
    if weights.len() != images.len() || sigmas.len() != images.len() {
        return Err(ImageUtilError::ShapeMismatch(format!(
            "{} images, {} weight maps and {} sigmas",
            images.len(),
            weights.len(),
            sigmas.len()
        )));
    }

    let shape = GridShape::of(first);
    for (i, (image, weight)) in images.iter().zip(weights).enumerate() {
        for (what, grid) in [("image", image), ("weight map", weight)] {
            let other = GridShape::of(grid);
            if other != shape {
                return Err(ImageUtilError::ShapeMismatch(format!(
                    "{what} {i} is {other}, expected {shape}"
                )));
            }
        }
    }

    log::debug!("stacking {} exposures of {shape}", images.len());

    let mut weighted_sum = Array2::<f64>::zeros(shape.to_tuple());
    let mut weight_sum = Array2::<f64>::zeros(shape.to_tuple());
    let mut variance = 0.0;

    for ((image, weight), sigma) in images.iter().zip(weights).zip(sigmas) {
        Zip::from(&mut weighted_sum)
            .and(&mut weight_sum)
            .and(image)
            .and(weight)
            .for_each(|acc, w_acc, &value, &w| {
                *acc += value * w;
                *w_acc += w;
            });
        variance += sigma * sigma * median(weight.iter()).unwrap_or(f64::NAN);
    }

    let total_median = median(weight_sum.iter()).unwrap_or(f64::NAN);
    if !(total_median.is_finite() && total_median != 0.0) {
        log::warn!("median of the stacked weight map is {total_median}, combined sigma is not finite");
    }

    let image = weighted_sum / &weight_sum;

    Ok(StackedImage {
        image,
        weight_sum,
        sigma: (variance / total_median).sqrt(),
        count: images.len(),
    })
}
