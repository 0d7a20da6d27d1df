//! Resampling and compositing primitives for simulated sky images.
//!
//! Grids are `ndarray::Array2<f64>` indexed `[row, col]`, i.e. `[y, x]`.
//! Operations borrow their inputs and return freshly allocated grids.
//!
//! # Module Organization
//!
//! ## Geometry
//! - **resample**: sub-pixel shifts, rotation about the center, regridding
//! - **interp**: interpolation orders, point sampling and bilinear regridding
//! - **compose**: placing kernels into larger grids with edge clipping
//!
//! ## Resolution
//! - **rebin**: flux-conserving block rebinning of images, weight maps,
//!   coordinate grids and masks
//! - **coords**: affine pixel to sky transforms and their rebinned form
//!
//! ## Statistics
//! - **noise**: background and shot noise realizations
//! - **stack**: weighted co-addition of exposures
//! - **grid**: crops, radial profiles, edge maps, point filtering and
//!   symmetry averaging

pub mod compose;
pub mod coords;
pub mod error;
pub mod grid;
pub mod interp;
pub mod noise;
pub mod overlap;
pub mod parallel;
pub mod rebin;
pub mod resample;
pub mod shape;
pub mod stack;
pub mod stats;

pub use compose::{add_kernel, add_kernel_aligned, subtract_kernel_aligned, Kernel};
pub use coords::{CoordinateTransform, SingularMatrixError};
pub use error::{ImageUtilError, Result};
pub use grid::{
    crop_center, filter_in_bounds, filter_overlap, gradient_magnitude, radial_profile,
    symmetry_average, PointSet,
};
pub use interp::{Boundary, InterpolationOrder};
pub use noise::{gaussian_background, poisson_noise, NoiseModel};
pub use rebin::{rebin_coord_transform, rebin_image, resize_by_factor, RebinnedImage};
pub use resample::{resample_onto_grid, rotate, shift, shift_with, ResampleOptions};
pub use shape::{GridShape, Position};
pub use stack::{stack_images, StackedImage};
