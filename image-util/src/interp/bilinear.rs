//! Bilinear interpolation on rectilinear 2D grids.
//!
//! Axes may be irregularly spaced; lookups use binary search. The first
//! axis indexes rows of the data array and the second indexes columns.

use ndarray::Array2;
use std::fmt;

use crate::error::ImageUtilError;

/// Error types for bilinear interpolation operations.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Coordinate is outside the valid interpolation domain
    OutOfBounds {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Axis coordinates are not strictly increasing
    NotIncreasing { axis: &'static str, index: usize },
    /// Fewer than two samples along an axis
    TooFewPoints { axis: &'static str, len: usize },
    /// Inconsistent data dimensions
    DimensionMismatch {
        row_len: usize,
        col_len: usize,
        data_shape: (usize, usize),
    },
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationError::OutOfBounds {
                axis,
                value,
                min,
                max,
            } => {
                write!(
                    f,
                    "{axis} coordinate {value} is outside valid range [{min}, {max}]"
                )
            }
            InterpolationError::NotIncreasing { axis, index } => {
                write!(
                    f,
                    "{axis} coordinates must be strictly increasing (violated at index {index})"
                )
            }
            InterpolationError::TooFewPoints { axis, len } => {
                write!(f, "{axis} axis needs at least 2 points, got {len}")
            }
            InterpolationError::DimensionMismatch {
                row_len,
                col_len,
                data_shape,
            } => {
                write!(
                    f,
                    "Data dimensions ({data_shape:?}) don't match coordinate lengths (rows: {row_len}, cols: {col_len})"
                )
            }
        }
    }
}

impl std::error::Error for InterpolationError {}

impl From<InterpolationError> for ImageUtilError {
    fn from(err: InterpolationError) -> Self {
        ImageUtilError::ShapeMismatch(err.to_string())
    }
}

/// Bilinear interpolator for data sampled on the product of two axes.
#[derive(Debug, Clone)]
pub struct BilinearInterpolator {
    /// Coordinates of each data row (strictly increasing)
    row_coords: Vec<f64>,
    /// Coordinates of each data column (strictly increasing)
    col_coords: Vec<f64>,
    /// 2D data array indexed as [row_index, col_index]
    data: Array2<f64>,
    /// Whether to allow extrapolation beyond grid bounds
    allow_extrapolation: bool,
}

fn check_axis(axis: &'static str, coords: &[f64]) -> Result<(), InterpolationError> {
    if coords.len() < 2 {
        return Err(InterpolationError::TooFewPoints {
            axis,
            len: coords.len(),
        });
    }
    for i in 1..coords.len() {
        // Written negated so NaN coordinates are rejected too
        if !(coords[i] > coords[i - 1]) {
            return Err(InterpolationError::NotIncreasing { axis, index: i });
        }
    }
    Ok(())
}

impl BilinearInterpolator {
    /// Create a new bilinear interpolator.
    ///
    /// # Arguments
    /// * `row_coords` - Coordinate of each data row, strictly increasing
    /// * `col_coords` - Coordinate of each data column, strictly increasing
    /// * `data` - 2D data array with shape (row_coords.len(), col_coords.len())
    pub fn new(
        row_coords: Vec<f64>,
        col_coords: Vec<f64>,
        data: Array2<f64>,
    ) -> Result<Self, InterpolationError> {
        let (nr, nc) = data.dim();
        if nr != row_coords.len() || nc != col_coords.len() {
            return Err(InterpolationError::DimensionMismatch {
                row_len: row_coords.len(),
                col_len: col_coords.len(),
                data_shape: (nr, nc),
            });
        }

        check_axis("row", &row_coords)?;
        check_axis("col", &col_coords)?;

        Ok(Self {
            row_coords,
            col_coords,
            data,
            allow_extrapolation: false,
        })
    }

    /// Enable or disable extrapolation beyond grid bounds.
    pub fn with_extrapolation(mut self, allow: bool) -> Self {
        self.allow_extrapolation = allow;
        self
    }

    /// Find indices and interpolation weight for a coordinate value.
    ///
    /// Returns (lower_index, upper_index, weight) where weight is the
    /// fraction of the way from lower to upper (0.0 at lower, 1.0 at upper).
    fn find_indices_and_weight(&self, coords: &[f64], value: f64) -> Option<(usize, usize, f64)> {
        let n = coords.len();

        if value < coords[0] {
            if self.allow_extrapolation {
                return Some((0, 1, (value - coords[0]) / (coords[1] - coords[0])));
            }
            return None;
        }
        if value > coords[n - 1] {
            if self.allow_extrapolation {
                return Some((
                    n - 2,
                    n - 1,
                    (value - coords[n - 2]) / (coords[n - 1] - coords[n - 2]),
                ));
            }
            return None;
        }

        // partition_point gives the first coordinate > value
        let upper = coords.partition_point(|&c| c <= value).clamp(1, n - 1);
        let lower = upper - 1;
        let weight = (value - coords[lower]) / (coords[upper] - coords[lower]);
        Some((lower, upper, weight))
    }

    fn locate(
        &self,
        axis: &'static str,
        coords: &[f64],
        value: f64,
    ) -> Result<(usize, usize, f64), InterpolationError> {
        self.find_indices_and_weight(coords, value)
            .ok_or(InterpolationError::OutOfBounds {
                axis,
                value,
                min: coords[0],
                max: coords[coords.len() - 1],
            })
    }

    /// Perform bilinear interpolation at the given coordinates.
    pub fn interpolate(&self, row: f64, col: f64) -> Result<f64, InterpolationError> {
        let (r_low, r_high, r_weight) = self.locate("row", &self.row_coords, row)?;
        let (c_low, c_high, c_weight) = self.locate("col", &self.col_coords, col)?;

        let q11 = self.data[[r_low, c_low]];
        let q12 = self.data[[r_low, c_high]];
        let q21 = self.data[[r_high, c_low]];
        let q22 = self.data[[r_high, c_high]];

        let value = q11 * (1.0 - r_weight) * (1.0 - c_weight)
            + q12 * (1.0 - r_weight) * c_weight
            + q21 * r_weight * (1.0 - c_weight)
            + q22 * r_weight * c_weight;

        Ok(value)
    }

    /// Evaluate on the Cartesian product `rows x cols`.
    ///
    /// The result has shape `(rows.len(), cols.len())`.
    pub fn evaluate_grid(&self, rows: &[f64], cols: &[f64]) -> Result<Array2<f64>, InterpolationError> {
        let mut out = Array2::zeros((rows.len(), cols.len()));
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                out[[i, j]] = self.interpolate(r, c)?;
            }
        }
        Ok(out)
    }
}
