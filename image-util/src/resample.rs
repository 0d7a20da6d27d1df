//! Geometric resampling of grids: sub-pixel shifts, rotations about the
//! center and regridding onto new rectilinear coordinates.
//!
//! Every function borrows its input and returns a freshly allocated array.
//! Shifts and rotations keep the input shape; samples whose source position
//! falls outside the original grid read the configured [`Boundary`] value
//! (zero by default).

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{ImageUtilError, Result};
use crate::interp::{BilinearInterpolator, Boundary, GridSampler, InterpolationOrder};

/// Options controlling how a grid is resampled
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResampleOptions {
    /// Interpolation order used for every sample
    #[serde(default)]
    pub order: InterpolationOrder,
    /// Value read for samples outside the source grid
    #[serde(default)]
    pub boundary: Boundary,
}

impl ResampleOptions {
    pub fn with_order(order: InterpolationOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }
}

/// Shift `grid` by `(dx, dy)` pixels.
///
/// Content moves `dx` columns to the right and `dy` rows down, so
/// `out[r, c] = grid(r - dy, c - dx)`. Uses constant zero extension at the
/// edges.
///
/// # Errors
/// `InvalidOrder` if `order` is negative or above [`crate::interp::MAX_ORDER`].
pub fn shift(grid: &ArrayView2<f64>, dx: f64, dy: f64, order: i32) -> Result<Array2<f64>> {
    let order = InterpolationOrder::new(order)?;
    Ok(shift_with(grid, dx, dy, &ResampleOptions::with_order(order)))
}

/// Shift with explicit interpolation order and boundary policy
pub fn shift_with(grid: &ArrayView2<f64>, dx: f64, dy: f64, options: &ResampleOptions) -> Array2<f64> {
    log::trace!(
        "shifting {:?} grid by ({dx}, {dy}) with order {}",
        grid.dim(),
        options.order.as_i32()
    );
    let sampler = GridSampler::new(grid.view(), options.order, options.boundary);
    Array2::from_shape_fn(grid.dim(), |(r, c)| {
        sampler.sample(r as f64 - dy, c as f64 - dx)
    })
}

/// Rotate `grid` counter-clockwise (as displayed, rows increasing downward)
/// by `angle_radians` about its center, keeping the input shape.
///
/// Bilinear interpolation, zero fill for corners that rotate in from
/// outside the original grid.
pub fn rotate(grid: &ArrayView2<f64>, angle_radians: f64) -> Array2<f64> {
    rotate_with(grid, angle_radians, &ResampleOptions::default())
}

/// Rotation with explicit interpolation order and boundary policy
pub fn rotate_with(grid: &ArrayView2<f64>, angle_radians: f64, options: &ResampleOptions) -> Array2<f64> {
    let (rows, cols) = grid.dim();
    let center_row = (rows as f64 - 1.0) / 2.0;
    let center_col = (cols as f64 - 1.0) / 2.0;
    let (sin, cos) = angle_radians.sin_cos();
    let sampler = GridSampler::new(grid.view(), options.order, options.boundary);

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        // Work in a y-up frame so positive angles turn counter-clockwise on screen
        let x = c as f64 - center_col;
        let y = center_row - r as f64;
        let src_x = cos * x + sin * y;
        let src_y = -sin * x + cos * y;
        sampler.sample(center_row - src_y, center_col + src_x)
    })
}

/// Resample `values`, known on the product of `x_in` x `y_in`, onto
/// `x_out` x `y_out` with a bilinear interpolant.
///
/// `x_in` indexes rows of `values` and `y_in` indexes columns; the result
/// has shape `(x_out.len(), y_out.len())`. Outputs beyond the input range are
/// extrapolated linearly from the edge cells. Only square, axis-aligned
/// output grids are guaranteed to be meaningful.
///
/// # Errors
/// `ShapeMismatch` if the axis lengths disagree with `values`, an axis has
/// fewer than two points, or an axis is not strictly increasing.
pub fn resample_onto_grid(
    x_in: &[f64],
    y_in: &[f64],
    values: &ArrayView2<f64>,
    x_out: &[f64],
    y_out: &[f64],
) -> Result<Array2<f64>> {
    let interpolator = BilinearInterpolator::new(x_in.to_vec(), y_in.to_vec(), values.to_owned())?
        .with_extrapolation(true);
    interpolator
        .evaluate_grid(x_out, y_out)
        .map_err(ImageUtilError::from)
}
