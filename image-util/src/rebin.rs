//! Flux-conserving rebinning of images and their co-registered maps, and
//! the matching update of the pixel <-> sky transform.

use nalgebra::Matrix2;
use ndarray::{s, Array2, ArrayView2, Zip};

use crate::coords::{map_coord_to_pix, CoordinateTransform};
use crate::error::{ImageUtilError, Result};
use crate::overlap::Overlap;
use crate::shape::GridShape;

/// Downsample `image` by averaging `factor` x `factor` blocks.
///
/// `factor == 1` returns an independent copy.
///
/// # Errors
/// `InvalidFactor` for `factor == 0`, `IndivisibleShape` when either
/// dimension is not a multiple of `factor`.
pub fn resize_by_factor(image: &ArrayView2<f64>, factor: usize) -> Result<Array2<f64>> {
    if factor < 1 {
        return Err(ImageUtilError::InvalidFactor(factor));
    }
    if factor == 1 {
        return Ok(image.to_owned());
    }

    let shape = GridShape::of(image);
    if !shape.is_divisible_by(factor) {
        return Err(ImageUtilError::IndivisibleShape {
            rows: shape.rows,
            cols: shape.cols,
            factor,
        });
    }

    let block_area = (factor * factor) as f64;
    let mut small = Array2::zeros((shape.rows / factor, shape.cols / factor));
    Zip::from(&mut small)
        .and(image.exact_chunks((factor, factor)))
        .for_each(|out, block| *out = block.sum() / block_area);
    Ok(small)
}

/// Outputs of [`rebin_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct RebinnedImage {
    /// Block-summed image (mean times `bin_size^2`)
    pub image: Array2<f64>,
    /// Block-averaged weight map
    pub weight_map: Array2<f64>,
    /// Background sigma scaled by `bin_size`
    pub background_sigma: f64,
    /// Block-averaged coordinate grids
    pub x_coords: Array2<f64>,
    pub y_coords: Array2<f64>,
    /// Binary mask: 1 wherever any input pixel of the block was set
    pub mask: Array2<f64>,
}

impl RebinnedImage {
    /// Split into `(image, weight_map, background_sigma, x_coords, y_coords, mask)`
    pub fn into_tuple(self) -> (Array2<f64>, Array2<f64>, f64, Array2<f64>, Array2<f64>, Array2<f64>) {
        (
            self.image,
            self.weight_map,
            self.background_sigma,
            self.x_coords,
            self.y_coords,
            self.mask,
        )
    }
}

/// Merge `bin_size` x `bin_size` pixels of an image and all maps registered
/// with it.
///
/// Trailing rows and columns that do not fill a whole bin are dropped
/// without error. The image is rescaled by `bin_size^2` so total flux is
/// conserved. The background sigma is multiplied by `bin_size` (linear, not
/// square-root-of-area, scaling). Mask blocks with any positive value
/// become exactly 1.
///
/// # Errors
/// `InvalidFactor` for `bin_size == 0`, `ShapeMismatch` if the maps are not
/// the image's shape, `TooSmall` if the image is smaller than one bin.
pub fn rebin_image(
    bin_size: usize,
    image: &ArrayView2<f64>,
    weight_map: &ArrayView2<f64>,
    background_sigma: f64,
    x_coords: &ArrayView2<f64>,
    y_coords: &ArrayView2<f64>,
    mask: &ArrayView2<f64>,
) -> Result<RebinnedImage> {
    if bin_size < 1 {
        return Err(ImageUtilError::InvalidFactor(bin_size));
    }

    let shape = GridShape::of(image);
    for (name, other_shape) in [
        ("weight map", GridShape::of(weight_map)),
        ("x coordinates", GridShape::of(x_coords)),
        ("y coordinates", GridShape::of(y_coords)),
        ("mask", GridShape::of(mask)),
    ] {
        if other_shape != shape {
            return Err(ImageUtilError::ShapeMismatch(format!(
                "{name} is {other_shape}, image is {shape}"
            )));
        }
    }

    let kept = shape.truncated_to_multiple(bin_size);
    let Some(region) = Overlap::between(shape, kept, 0, 0) else {
        return Err(ImageUtilError::TooSmall {
            rows: shape.rows,
            cols: shape.cols,
            size: bin_size,
        });
    };
    if kept != shape {
        log::debug!("rebinning by {bin_size} drops trailing pixels: {shape} -> {kept}");
    }

    let resize = |grid: &ArrayView2<f64>| {
        let cropped = grid.slice(s![region.rows.target.clone(), region.cols.target.clone()]);
        resize_by_factor(&cropped, bin_size)
    };

    let mut binned = resize(image)?;
    binned *= (bin_size * bin_size) as f64;

    let mut binned_mask = resize(mask)?;
    binned_mask.mapv_inplace(|v| if v > 0.0 { 1.0 } else { v });

    Ok(RebinnedImage {
        image: binned,
        weight_map: resize(weight_map)?,
        background_sigma: bin_size as f64 * background_sigma,
        x_coords: resize(x_coords)?,
        y_coords: resize(y_coords)?,
        mask: binned_mask,
    })
}

/// Coordinate transform for a grid rebinned `factor`-to-1.
///
/// Angle-to-pixel scales down by `factor`, pixel-to-angle scales up, and the
/// pixel position of sky (0, 0) moves to `(ref + 0.5) / factor - 0.5`, which
/// keeps pixel centers aligned for odd and even factors. The sky anchor of
/// pixel (0, 0) is recomputed from the new offsets.
///
/// # Errors
/// `InvalidFactor` for `factor == 0`.
pub fn rebin_coord_transform(
    factor: usize,
    x_at_radec_0: f64,
    y_at_radec_0: f64,
    pix_to_coord: &Matrix2<f64>,
    coord_to_pix: &Matrix2<f64>,
) -> Result<CoordinateTransform> {
    if factor < 1 {
        return Err(ImageUtilError::InvalidFactor(factor));
    }
    let f = factor as f64;

    let coord_to_pix = *coord_to_pix / f;
    let pix_to_coord = *pix_to_coord * f;
    let x_at_radec_0 = (x_at_radec_0 + 0.5) / f - 0.5;
    let y_at_radec_0 = (y_at_radec_0 + 0.5) / f - 0.5;
    let (ra_at_xy_0, dec_at_xy_0) =
        map_coord_to_pix(-x_at_radec_0, -y_at_radec_0, 0.0, 0.0, &pix_to_coord);

    Ok(CoordinateTransform {
        ra_at_xy_0,
        dec_at_xy_0,
        x_at_radec_0,
        y_at_radec_0,
        pix_to_coord,
        coord_to_pix,
    })
}
