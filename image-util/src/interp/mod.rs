//! Interpolation primitives used by the resampler.

pub mod bilinear;
pub mod order;
pub mod sample;
pub mod spline;

pub use bilinear::{BilinearInterpolator, InterpolationError};
pub use order::{InterpolationOrder, MAX_ORDER};
pub use sample::{sample, Boundary, GridSampler};
pub use spline::spline_coefficients;
