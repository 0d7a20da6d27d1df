//! Grid dimensions and shape predicates

use ndarray::{ArrayBase, Data, Ix2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid dimensions in ndarray order.
///
/// `rows` is the y extent and `cols` the x extent, so a shape converts
/// directly to and from `Array2::dim()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of rows (y extent)
    pub rows: usize,
    /// Number of columns (x extent)
    pub cols: usize,
}

impl GridShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Shape of an existing 2D array
    pub fn of<S: Data>(array: &ArrayBase<S, Ix2>) -> Self {
        let (rows, cols) = array.dim();
        Self { rows, cols }
    }

    /// Get total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Convert to tuple (rows, cols)
    pub fn to_tuple(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Geometric center as (x, y), i.e. ((cols-1)/2, (rows-1)/2)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.cols as f64 - 1.0) / 2.0,
            (self.rows as f64 - 1.0) / 2.0,
        )
    }

    /// Both dimensions odd, so the center falls on a pixel
    pub fn is_odd(&self) -> bool {
        self.rows % 2 == 1 && self.cols % 2 == 1
    }

    /// Rows and cols share the same parity
    pub fn has_uniform_parity(&self) -> bool {
        self.rows % 2 == self.cols % 2
    }

    /// Both dimensions are exact multiples of `factor`
    pub fn is_divisible_by(&self, factor: usize) -> bool {
        factor > 0 && self.rows % factor == 0 && self.cols % factor == 0
    }

    /// Largest shape not exceeding this one whose dimensions are multiples of `factor`
    pub fn truncated_to_multiple(&self, factor: usize) -> Self {
        if factor == 0 {
            return *self;
        }
        Self {
            rows: self.rows / factor * factor,
            cols: self.cols / factor * factor,
        }
    }
}

/// A real-valued pixel position; `x` runs along columns and `y` along rows.
///
/// May be fractional or lie outside any particular grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for GridShape {
    fn from(dimensions: (usize, usize)) -> Self {
        Self::new(dimensions.0, dimensions.1)
    }
}

impl From<GridShape> for (usize, usize) {
    fn from(shape: GridShape) -> Self {
        shape.to_tuple()
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
