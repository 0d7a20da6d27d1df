//! Kernel compositing: adds odd-sized kernels (typically PSFs) into a larger
//! grid at integer or sub-pixel positions, clipped at the grid edges.
//!
//! A kernel whose footprint misses the target entirely is not an error; the
//! target comes back unchanged.
//!
//! The free functions take plain arrays and check the kernel shape on every
//! call. A [`Kernel`] is checked once and can then be placed repeatedly.

use ndarray::{s, Array2, ArrayView2};

use crate::error::{ImageUtilError, Result};
use crate::interp::InterpolationOrder;
use crate::overlap::Overlap;
use crate::resample::{shift_with, ResampleOptions};
use crate::shape::{GridShape, Position};

/// A grid with odd dimensions, centered on `((rows-1)/2, (cols-1)/2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Array2<f64>,
}

impl Kernel {
    /// Wrap `data`, rejecting even dimensions.
    pub fn new(data: Array2<f64>) -> Result<Self> {
        check_odd(GridShape::of(&data))?;
        Ok(Self { data })
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn shape(&self) -> GridShape {
        GridShape::of(&self.data)
    }

    /// Center pixel as (row, col)
    pub fn center(&self) -> (usize, usize) {
        let shape = self.shape();
        ((shape.rows - 1) / 2, (shape.cols - 1) / 2)
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }

    /// [`add_kernel`] without re-checking the kernel shape.
    ///
    /// # Errors
    /// `InvalidOrder` for an unsupported order.
    pub fn add_to(&self, target: &ArrayView2<f64>, position: Position, order: i32) -> Result<Array2<f64>> {
        let options = ResampleOptions::with_order(InterpolationOrder::new(order)?);
        Ok(place_at_position(target, position, &self.view(), &options))
    }

    /// [`add_kernel_aligned`] without re-checking the kernel shape.
    pub fn add_aligned_to(&self, target: &ArrayView2<f64>, xi: isize, yi: isize) -> Array2<f64> {
        place(target, xi, yi, &self.view(), 1.0)
    }

    /// [`subtract_kernel_aligned`] without re-checking the kernel shape.
    pub fn subtract_aligned_from(&self, target: &ArrayView2<f64>, xi: isize, yi: isize) -> Array2<f64> {
        place(target, xi, yi, &self.view(), -1.0)
    }
}

fn check_odd(shape: GridShape) -> Result<()> {
    if shape.rows == 0 || shape.cols == 0 || !shape.is_odd() {
        return Err(ImageUtilError::InvalidKernelShape {
            rows: shape.rows,
            cols: shape.cols,
        });
    }
    Ok(())
}

/// Add `kernel` centered on the sub-pixel `position`.
///
/// The position is rounded to the nearest pixel (ties to even), the kernel is
/// shifted by the remaining fraction with interpolation of the given `order`,
/// and the result is placed with [`add_kernel_aligned`].
///
/// # Errors
/// `InvalidKernelShape` for even kernel dimensions, `InvalidOrder` for an
/// unsupported order. Both are checked before any resampling.
pub fn add_kernel(
    target: &ArrayView2<f64>,
    position: Position,
    kernel: &ArrayView2<f64>,
    order: i32,
) -> Result<Array2<f64>> {
    check_odd(GridShape::of(kernel))?;
    let options = ResampleOptions::with_order(InterpolationOrder::new(order)?);
    Ok(place_at_position(target, position, kernel, &options))
}

/// Add `kernel` with its center pixel on target column `xi`, row `yi`.
///
/// Only the part of the kernel that overlaps the target is added. When the
/// footprint does not overlap at all the target is returned unchanged.
///
/// # Errors
/// `InvalidKernelShape` if either kernel dimension is even.
pub fn add_kernel_aligned(
    target: &ArrayView2<f64>,
    xi: isize,
    yi: isize,
    kernel: &ArrayView2<f64>,
) -> Result<Array2<f64>> {
    check_odd(GridShape::of(kernel))?;
    Ok(place(target, xi, yi, kernel, 1.0))
}

/// Inverse of [`add_kernel_aligned`]: subtracts the same clipped region.
pub fn subtract_kernel_aligned(
    target: &ArrayView2<f64>,
    xi: isize,
    yi: isize,
    kernel: &ArrayView2<f64>,
) -> Result<Array2<f64>> {
    check_odd(GridShape::of(kernel))?;
    Ok(place(target, xi, yi, kernel, -1.0))
}

// Kernel shape is already known to be odd; shifting keeps the shape.
fn place_at_position(
    target: &ArrayView2<f64>,
    position: Position,
    kernel: &ArrayView2<f64>,
    options: &ResampleOptions,
) -> Array2<f64> {
    if !position.x.is_finite() || !position.y.is_finite() {
        log::debug!("kernel position {position:?} is not finite, skipping placement");
        return target.to_owned();
    }

    let xi = position.x.round_ties_even();
    let yi = position.y.round_ties_even();
    let shifted = shift_with(kernel, position.x - xi, position.y - yi, options);

    place(target, xi as isize, yi as isize, &shifted.view(), 1.0)
}

fn place(target: &ArrayView2<f64>, xi: isize, yi: isize, kernel: &ArrayView2<f64>, sign: f64) -> Array2<f64> {
    let kernel_shape = GridShape::of(kernel);
    let mut out = target.to_owned();
    let Some(overlap) = Overlap::centered(GridShape::of(target), kernel_shape, yi, xi) else {
        log::debug!(
            "{kernel_shape} kernel at ({xi}, {yi}) misses {:?} target, leaving it unchanged",
            target.dim()
        );
        return out;
    };

    let clipped = kernel.slice(s![
        overlap.rows.source.clone(),
        overlap.cols.source.clone()
    ]);
    let mut region = out.slice_mut(s![overlap.rows.target, overlap.cols.target]);
    region.scaled_add(sign, &clipped);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_block_of_ones_at_center() {
        let target = Array2::<f64>::zeros((5, 5));
        let kernel = Array2::<f64>::ones((3, 3));
        let out = add_kernel_aligned(&target.view(), 2, 2, &kernel.view()).unwrap();

        let mut expected = Array2::<f64>::zeros((5, 5));
        expected.slice_mut(s![1..4, 1..4]).fill(1.0);
        assert_eq!(out, expected);
        // Input untouched
        assert_eq!(target.sum(), 0.0);
    }

    #[test]
    fn test_clipped_at_corner() {
        let target = Array2::<f64>::zeros((4, 4));
        let kernel = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let out = add_kernel_aligned(&target.view(), 0, 0, &kernel.view()).unwrap();
        assert_eq!(out[[0, 0]], 5.0);
        assert_eq!(out[[0, 1]], 6.0);
        assert_eq!(out[[1, 0]], 8.0);
        assert_eq!(out[[1, 1]], 9.0);
        assert_eq!(out.sum(), 28.0);
    }

    #[test]
    fn test_x_is_column_y_is_row() {
        let target = Array2::<f64>::zeros((5, 7));
        let kernel = array![[1.0]];
        let out = add_kernel_aligned(&target.view(), 6, 1, &kernel.view()).unwrap();
        assert_eq!(out[[1, 6]], 1.0);
    }

    #[test]
    fn test_complete_miss_returns_target() {
        let target = Array2::from_elem((4, 4), 3.0);
        let kernel = Array2::<f64>::ones((3, 3));
        for (x, y) in [(-2, 0), (5, 1), (1, 100), (-1000, -1000)] {
            let out = add_kernel_aligned(&target.view(), x, y, &kernel.view()).unwrap();
            assert_eq!(out, target);
        }
        // One pixel of overlap still counts
        let out = add_kernel_aligned(&target.view(), -1, -1, &kernel.view()).unwrap();
        assert_eq!(out[[0, 0]], 4.0);
    }

    #[test]
    fn test_even_kernel_rejected() {
        let target = Array2::<f64>::zeros((5, 5));
        let kernel = Array2::<f64>::ones((2, 3));
        assert_eq!(
            add_kernel_aligned(&target.view(), 2, 2, &kernel.view()),
            Err(ImageUtilError::InvalidKernelShape { rows: 2, cols: 3 })
        );
        assert!(matches!(
            add_kernel(&target.view(), Position::new(2.3, 2.0), &kernel.view(), 1),
            Err(ImageUtilError::InvalidKernelShape { .. })
        ));
    }

    #[test]
    fn test_add_then_subtract_restores() {
        let target = Array2::from_shape_fn((6, 6), |(r, c)| (r * 6 + c) as f64 * 0.25);
        let kernel = array![[0.5, 1.0, 0.5], [1.0, 2.0, 1.0], [0.5, 1.0, 0.5]];
        let added = add_kernel_aligned(&target.view(), 3, 2, &kernel.view()).unwrap();
        let restored = subtract_kernel_aligned(&added.view(), 3, 2, &kernel.view()).unwrap();
        assert_eq!(restored, target);
    }

    #[test]
    fn test_integer_position_matches_aligned() {
        let target = Array2::<f64>::zeros((7, 7));
        let kernel = array![[0.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 0.0]];
        let aligned = add_kernel_aligned(&target.view(), 3, 4, &kernel.view()).unwrap();
        for order in 0..=3 {
            let shifted =
                add_kernel(&target.view(), Position::new(3.0, 4.0), &kernel.view(), order).unwrap();
            for (a, b) in shifted.iter().zip(aligned.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_subpixel_position_conserves_interior_flux() {
        let target = Array2::<f64>::zeros((9, 9));
        let mut kernel = Array2::<f64>::zeros((5, 5));
        kernel[[2, 2]] = 1.0;
        let out = add_kernel(&target.view(), Position::new(4.25, 3.5), &kernel.view(), 1).unwrap();
        assert_relative_eq!(out.sum(), 1.0, epsilon = 1e-12);
        // Rounded to (x=4, y=4) with the flux pulled up by half a row
        assert_relative_eq!(out[[3, 4]], 0.375, epsilon = 1e-12);
        assert_relative_eq!(out[[4, 5]], 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_order_rejected() {
        let target = Array2::<f64>::zeros((5, 5));
        let kernel = Array2::<f64>::ones((3, 3));
        assert_eq!(
            add_kernel(&target.view(), Position::new(1.5, 1.5), &kernel.view(), -2),
            Err(ImageUtilError::InvalidOrder(-2))
        );
    }

    #[test]
    fn test_kernel_newtype() {
        assert!(Kernel::new(Array2::zeros((4, 3))).is_err());
        let kernel = Kernel::new(Array2::zeros((5, 3))).unwrap();
        assert_eq!(kernel.center(), (2, 1));
        assert_eq!(kernel.shape(), GridShape::new(5, 3));
    }

    #[test]
    fn test_kernel_methods_match_free_functions() {
        let target = Array2::from_shape_fn((8, 9), |(r, c)| (r * 9 + c) as f64 * 0.5);
        let data = array![[0.5, 1.0, 0.5], [1.0, 3.0, 1.0], [0.5, 1.0, 0.5]];
        let kernel = Kernel::new(data.clone()).unwrap();

        for (x, y) in [(4, 4), (0, 7), (-1, 2), (20, 20)] {
            assert_eq!(
                kernel.add_aligned_to(&target.view(), x, y),
                add_kernel_aligned(&target.view(), x, y, &data.view()).unwrap()
            );
            assert_eq!(
                kernel.subtract_aligned_from(&target.view(), x, y),
                subtract_kernel_aligned(&target.view(), x, y, &data.view()).unwrap()
            );
        }

        let position = Position::new(3.4, 5.6);
        assert_eq!(
            kernel.add_to(&target.view(), position, 3).unwrap(),
            add_kernel(&target.view(), position, &data.view(), 3).unwrap()
        );
        assert_eq!(
            kernel.add_to(&target.view(), position, 9),
            Err(ImageUtilError::InvalidOrder(9))
        );
    }

    #[test]
    fn test_kernel_reused_across_placements() {
        let kernel = Kernel::new(Array2::ones((3, 3))).unwrap();
        let mut image = Array2::<f64>::zeros((10, 10));
        for (x, y) in [(2, 2), (7, 2), (2, 7), (7, 7)] {
            image = kernel.add_aligned_to(&image.view(), x, y);
        }
        assert_eq!(image.sum(), 36.0);
        let image = kernel.subtract_aligned_from(&image.view(), 7, 7);
        assert_eq!(image.sum(), 27.0);
        assert_eq!(image[[7, 7]], 0.0);
    }
}
