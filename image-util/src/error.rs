//! Error types shared by every grid operation in this crate.

use thiserror::Error;

use crate::coords::SingularMatrixError;

/// Errors raised by resampling, compositing, rebinning and stacking.
///
/// Shape and parameter violations are reported before any pixel is touched;
/// no operation returns a partially computed grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageUtilError {
    #[error("interpolation order {0} is not supported (expected 0..=5)")]
    InvalidOrder(i32),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("kernel dimensions must be odd, got {rows}x{cols}")]
    InvalidKernelShape { rows: usize, cols: usize },
    #[error("grid of {rows}x{cols} is not divisible by factor {factor}")]
    IndivisibleShape {
        rows: usize,
        cols: usize,
        factor: usize,
    },
    #[error("rebin factor must be >= 1, got {0}")]
    InvalidFactor(usize),
    #[error("grid of {rows}x{cols} is smaller than the requested {size}x{size} crop")]
    TooSmall { rows: usize, cols: usize, size: usize },
    #[error("parity mismatch: {0}")]
    ParityMismatch(String),
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    SingularMatrix(#[from] SingularMatrixError),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ImageUtilError>;
