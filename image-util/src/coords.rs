//! Affine pixel <-> sky coordinate transforms.
//!
//! A transform is a pair of 2x2 matrices (pixel -> angle and its inverse)
//! plus the two anchors that tie the grids together: the sky coordinate of
//! pixel (0, 0) and the pixel coordinate of sky position (0, 0).

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;

/// Error when matrix inversion fails due to singular matrix
#[derive(Error, Debug, Clone, PartialEq)]
#[error("singular matrix: determinant={determinant:.6e}")]
pub struct SingularMatrixError {
    /// The determinant value (zero or near-zero)
    pub determinant: f64,
}

/// Threshold for considering a determinant as zero
const DETERMINANT_EPSILON: f64 = 1e-20;

/// Invert a 2x2 matrix with error handling for singular matrices
pub fn invert_matrix(matrix: &Matrix2<f64>) -> std::result::Result<Matrix2<f64>, SingularMatrixError> {
    let det = matrix.determinant();

    if det.abs() < DETERMINANT_EPSILON || !det.is_finite() {
        return Err(SingularMatrixError { determinant: det });
    }

    matrix
        .try_inverse()
        .ok_or(SingularMatrixError { determinant: det })
}

/// Create a 2x2 rotation matrix
///
/// # Arguments
/// * `angle_rad` - Rotation angle in radians (counter-clockwise)
pub fn rotation_matrix(angle_rad: f64) -> Matrix2<f64> {
    let c = angle_rad.cos();
    let s = angle_rad.sin();
    Matrix2::new(c, -s, s, c)
}

/// Create a 2x2 scaling matrix
pub fn scale_matrix(sx: f64, sy: f64) -> Matrix2<f64> {
    Matrix2::new(sx, 0.0, 0.0, sy)
}

/// Apply `matrix` to `(ra, dec)` and offset the result by `(x_0, y_0)`.
///
/// With `coord_to_pix` this maps angles to pixels; it is equally used with
/// `pix_to_coord` and negated pixel offsets to recover a sky anchor.
pub fn map_coord_to_pix(ra: f64, dec: f64, x_0: f64, y_0: f64, matrix: &Matrix2<f64>) -> (f64, f64) {
    let v = matrix * Vector2::new(ra, dec);
    (v.x + x_0, v.y + y_0)
}

/// Apply `matrix` to pixel `(x, y)` and offset the result by `(ra_0, dec_0)`.
pub fn map_pix_to_coord(x: f64, y: f64, ra_0: f64, dec_0: f64, matrix: &Matrix2<f64>) -> (f64, f64) {
    let v = matrix * Vector2::new(x, y);
    (v.x + ra_0, v.y + dec_0)
}

/// Pixel <-> sky mapping for a regular pixel grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransform {
    /// Sky coordinates of pixel (0, 0)
    pub ra_at_xy_0: f64,
    pub dec_at_xy_0: f64,
    /// Pixel coordinates of sky position (0, 0)
    pub x_at_radec_0: f64,
    pub y_at_radec_0: f64,
    /// Pixel offsets to angular offsets
    pub pix_to_coord: Matrix2<f64>,
    /// Angular offsets to pixel offsets
    pub coord_to_pix: Matrix2<f64>,
}

impl CoordinateTransform {
    /// Build from the pixel -> angle matrix and the sky coordinate of pixel (0, 0).
    ///
    /// # Errors
    /// `SingularMatrix` if `pix_to_coord` cannot be inverted.
    pub fn new(pix_to_coord: Matrix2<f64>, ra_at_xy_0: f64, dec_at_xy_0: f64) -> Result<Self> {
        let coord_to_pix = invert_matrix(&pix_to_coord)?;
        let (x_at_radec_0, y_at_radec_0) =
            map_coord_to_pix(-ra_at_xy_0, -dec_at_xy_0, 0.0, 0.0, &coord_to_pix);
        Ok(Self {
            ra_at_xy_0,
            dec_at_xy_0,
            x_at_radec_0,
            y_at_radec_0,
            pix_to_coord,
            coord_to_pix,
        })
    }

    /// Square grid of `num_pix` pixels of size `delta_pix` centered on sky (0, 0)
    pub fn centered(num_pix: usize, delta_pix: f64) -> Result<Self> {
        let center = (num_pix as f64 - 1.0) / 2.0;
        let pix_to_coord = scale_matrix(delta_pix, delta_pix);
        let (ra_0, dec_0) = map_pix_to_coord(-center, -center, 0.0, 0.0, &pix_to_coord);
        Self::new(pix_to_coord, ra_0, dec_0)
    }

    pub fn pixel_to_sky(&self, x: f64, y: f64) -> (f64, f64) {
        map_pix_to_coord(x, y, self.ra_at_xy_0, self.dec_at_xy_0, &self.pix_to_coord)
    }

    pub fn sky_to_pixel(&self, ra: f64, dec: f64) -> (f64, f64) {
        map_coord_to_pix(ra, dec, self.x_at_radec_0, self.y_at_radec_0, &self.coord_to_pix)
    }

    /// Linear pixel size in angular units
    pub fn pixel_scale(&self) -> f64 {
        self.pix_to_coord.determinant().abs().sqrt()
    }

    /// Transform describing the same sky after a `factor`-to-1 rebin.
    pub fn rebinned(&self, factor: usize) -> Result<Self> {
        crate::rebin::rebin_coord_transform(
            factor,
            self.x_at_radec_0,
            self.y_at_radec_0,
            &self.pix_to_coord,
            &self.coord_to_pix,
        )
    }
}
