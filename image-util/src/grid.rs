//! Grid and point-list utilities: centered cut-outs, radial profiles, edge
//! maps, position filtering and rotational symmetrization.

use ndarray::{s, Array2, ArrayView2};
use std::f64::consts::TAU;

use crate::error::{ImageUtilError, Result};
use crate::resample::rotate;
use crate::shape::GridShape;

/// Cut the centered `size` x `size` region out of `image`.
///
/// The margin removed on each side is equal, which is why the source must
/// have the same parity on both axes and the same parity as `size`.
///
/// # Errors
/// - `TooSmall` if either dimension is below `size`
/// - `ParityMismatch` if rows and cols differ in parity, or if their parity
///   differs from `size`
pub fn crop_center(image: &ArrayView2<f64>, size: usize) -> Result<Array2<f64>> {
    let shape = GridShape::of(image);
    if shape.rows < size || shape.cols < size {
        return Err(ImageUtilError::TooSmall {
            rows: shape.rows,
            cols: shape.cols,
            size,
        });
    }
    if !shape.has_uniform_parity() {
        return Err(ImageUtilError::ParityMismatch(format!(
            "cannot center a crop in a {shape} grid with mixed odd and even axes"
        )));
    }
    if shape.rows % 2 != size % 2 {
        return Err(ImageUtilError::ParityMismatch(format!(
            "cannot crop {shape} to {size}x{size}; odd grids crop to odd sizes and even to even"
        )));
    }

    let row_min = (shape.rows - size) / 2;
    let col_min = (shape.cols - size) / 2;
    Ok(image
        .slice(s![row_min..row_min + size, col_min..col_min + size])
        .to_owned())
}

/// Mean pixel value in unit-width annuli around `center`.
///
/// `center` is `(x, y)` in pixels. Each pixel lands in bin
/// `floor(distance)`; the result runs from radius 0 out to the farthest
/// pixel. Bins that receive no pixels are NaN. An empty grid has an empty
/// profile.
///
/// # Errors
/// `InvalidParameter` if `center` is not finite, or if the farthest pixel
/// lies more than `2 * (rows + cols)` pixels from it.
pub fn radial_profile(data: &ArrayView2<f64>, center: (f64, f64)) -> Result<Vec<f64>> {
    let (cx, cy) = center;
    if !cx.is_finite() || !cy.is_finite() {
        return Err(ImageUtilError::InvalidParameter(format!(
            "radial profile center ({cx}, {cy}) is not finite"
        )));
    }
    let (rows, cols) = data.dim();
    if rows == 0 || cols == 0 {
        return Ok(Vec::new());
    }

    let far_x = cx.abs().max((cols as f64 - 1.0 - cx).abs());
    let far_y = cy.abs().max((rows as f64 - 1.0 - cy).abs());
    let max_radius = far_x.hypot(far_y);
    let limit = 2 * (rows + cols);
    if max_radius > limit as f64 {
        return Err(ImageUtilError::InvalidParameter(format!(
            "radial profile center ({cx}, {cy}) is {max_radius:.1} px from a {rows}x{cols} grid, limit {limit}"
        )));
    }

    let bins = max_radius as usize + 1;
    let mut sums = vec![0.0; bins];
    let mut counts = vec![0usize; bins];
    for ((row, col), &value) in data.indexed_iter() {
        let radius = (col as f64 - cx).hypot(row as f64 - cy);
        let bin = (radius as usize).min(bins - 1);
        sums[bin] += value;
        counts[bin] += 1;
    }

    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| if count == 0 { f64::NAN } else { sum / count as f64 })
        .collect())
}

/// Sobel edge magnitude, same shape as `image`.
///
/// Uses the smoothing-normalized kernels (`[1, 2, 1] / 4` across the
/// derivative) and combines them as `sqrt((gx^2 + gy^2) / 2)`. Border pixels
/// read replicated edge values.
pub fn gradient_magnitude(image: &ArrayView2<f64>) -> Array2<f64> {
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    let at = |r: isize, c: isize| -> f64 {
        let r = r.clamp(0, rows as isize - 1) as usize;
        let c = c.clamp(0, cols as isize - 1) as usize;
        image[[r, c]]
    };

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (r, c) = (r as isize, c as isize);
        let gx = (at(r - 1, c + 1) + 2.0 * at(r, c + 1) + at(r + 1, c + 1)
            - at(r - 1, c - 1)
            - 2.0 * at(r, c - 1)
            - at(r + 1, c - 1))
            / 4.0;
        let gy = (at(r + 1, c - 1) + 2.0 * at(r + 1, c) + at(r + 1, c + 1)
            - at(r - 1, c - 1)
            - 2.0 * at(r - 1, c)
            - at(r - 1, c + 1))
            / 4.0;
        ((gx * gx + gy * gy) / 2.0).sqrt()
    })
}

/// Average of `symmetry` copies of `image` rotated in steps of
/// `360 / symmetry` degrees about its center.
///
/// # Errors
/// `InvalidParameter` if `symmetry` is zero.
pub fn symmetry_average(image: &ArrayView2<f64>, symmetry: usize) -> Result<Array2<f64>> {
    if symmetry == 0 {
        return Err(ImageUtilError::InvalidParameter(
            "symmetry order must be at least 1".to_string(),
        ));
    }

    let step = TAU / symmetry as f64;
    let mut average = Array2::<f64>::zeros(image.dim());
    for i in 0..symmetry {
        average += &rotate(image, step * i as f64);
    }
    average /= symmetry as f64;
    Ok(average)
}

/// Candidate positions as parallel x and y lists of equal length
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSet {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl PointSet {
    /// # Errors
    /// `ShapeMismatch` if the lists differ in length.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(ImageUtilError::ShapeMismatch(format!(
                "{} x coordinates but {} y coordinates",
                xs.len(),
                ys.len()
            )));
        }
        Ok(Self { xs, ys })
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.xs, self.ys)
    }

    /// Drop every point closer than `min_distance` on both axes to any
    /// earlier point in the original order. Survivors keep their order.
    ///
    /// Points already dropped still shadow the points after them.
    pub fn filter_overlap(&self, min_distance: f64) -> Self {
        let keep: Vec<bool> = (0..self.len())
            .map(|i| {
                !(0..i).any(|j| {
                    (self.xs[i] - self.xs[j]).abs() < min_distance
                        && (self.ys[i] - self.ys[j]).abs() < min_distance
                })
            })
            .collect();
        self.retain_where(&keep)
    }

    /// Keep points inside the centered square field of view of `num_pix`
    /// pixels of size `delta_pix`; points on the edge are kept. Only points
    /// that compare outside are dropped, so NaN coordinates are kept.
    pub fn filter_in_bounds(&self, num_pix: usize, delta_pix: f64) -> Self {
        let max = delta_pix * num_pix as f64 / 2.0;
        let min = -max;
        let keep: Vec<bool> = self
            .iter()
            .map(|(x, y)| !(x < min || x > max || y < min || y > max))
            .collect();
        self.retain_where(&keep)
    }

    fn retain_where(&self, keep: &[bool]) -> Self {
        let (xs, ys) = self
            .iter()
            .zip(keep)
            .filter(|(_, keep)| **keep)
            .map(|(point, _)| point)
            .unzip();
        Self { xs, ys }
    }
}

/// [`PointSet::filter_overlap`] over plain coordinate slices.
///
/// # Errors
/// `ShapeMismatch` if `xs` and `ys` differ in length.
pub fn filter_overlap(xs: &[f64], ys: &[f64], min_distance: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let points = PointSet::new(xs.to_vec(), ys.to_vec())?;
    let filtered = points.filter_overlap(min_distance);
    log::debug!(
        "overlap filter kept {} of {} points",
        filtered.len(),
        points.len()
    );
    Ok(filtered.into_parts())
}

/// [`PointSet::filter_in_bounds`] over plain coordinate slices.
///
/// # Errors
/// `ShapeMismatch` if `xs` and `ys` differ in length.
pub fn filter_in_bounds(
    xs: &[f64],
    ys: &[f64],
    num_pix: usize,
    delta_pix: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let points = PointSet::new(xs.to_vec(), ys.to_vec())?;
    Ok(points.filter_in_bounds(num_pix, delta_pix).into_parts())
}
