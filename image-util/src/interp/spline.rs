//! B-spline interpolation of orders 2 through 5.
//!
//! A grid is first converted to B-spline coefficients with a recursive
//! prefilter so that the spline passes exactly through every pixel value;
//! samples are then weighted sums of coefficients under the B-spline basis
//! of the requested degree. The grid is extended by mirroring about the edge
//! pixels while computing coefficients.

use ndarray::{Array2, ArrayView2, Axis};

/// Relative accuracy of the truncated causal initialization.
const INIT_TOLERANCE: f64 = 1e-15;

/// Poles of the prefilter for a given degree.
fn poles(degree: usize) -> &'static [f64] {
    match degree {
        2 => &[-0.171_572_875_253_809_9],
        3 => &[-0.267_949_192_431_122_7],
        4 => &[-0.361_341_225_900_220_2, -0.013_725_429_297_339_178],
        5 => &[-0.430_575_347_099_973_8, -0.043_096_288_203_264_68],
        _ => &[],
    }
}

/// Centered B-spline basis function of `degree` evaluated at `x`.
pub(crate) fn basis(degree: usize, x: f64) -> f64 {
    let x = x.abs();
    match degree {
        2 => {
            if x < 0.5 {
                0.75 - x * x
            } else if x < 1.5 {
                0.5 * (1.5 - x).powi(2)
            } else {
                0.0
            }
        }
        3 => {
            if x < 1.0 {
                2.0 / 3.0 - x * x + 0.5 * x.powi(3)
            } else if x < 2.0 {
                (2.0 - x).powi(3) / 6.0
            } else {
                0.0
            }
        }
        4 => {
            if x < 0.5 {
                115.0 / 192.0 + x * x * (x * x / 4.0 - 5.0 / 8.0)
            } else if x < 1.5 {
                (55.0 + 20.0 * x - 120.0 * x.powi(2) + 80.0 * x.powi(3) - 16.0 * x.powi(4)) / 96.0
            } else if x < 2.5 {
                (5.0 - 2.0 * x).powi(4) / 384.0
            } else {
                0.0
            }
        }
        5 => {
            if x < 1.0 {
                11.0 / 20.0 - x.powi(2) / 2.0 + x.powi(4) / 4.0 - x.powi(5) / 12.0
            } else if x < 2.0 {
                17.0 / 40.0 + 5.0 * x / 8.0 - 7.0 * x.powi(2) / 4.0 + 5.0 * x.powi(3) / 4.0
                    - 3.0 * x.powi(4) / 8.0
                    + x.powi(5) / 24.0
            } else if x < 3.0 {
                (3.0 - x).powi(5) / 120.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Mirror `index` into `0..len` about the first and last samples.
pub(crate) fn mirror_index(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let i = index.rem_euclid(period);
    if i < len as isize {
        i as usize
    } else {
        (period - i) as usize
    }
}

fn causal_init(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    let horizon = (INIT_TOLERANCE.ln() / z.abs().ln()).ceil() as usize;
    if horizon < n {
        let mut zn = z;
        let mut sum = c[0];
        for &value in &c[1..horizon] {
            sum += zn * value;
            zn *= z;
        }
        return sum;
    }

    let iz = 1.0 / z;
    let mut zn = z;
    let mut z2n = z.powi(n as i32 - 1);
    let mut sum = c[0] + z2n * c[n - 1];
    z2n *= z2n * iz;
    for &value in &c[1..n - 1] {
        sum += (zn + z2n) * value;
        zn *= z;
        z2n *= iz;
    }
    sum / (1.0 - zn * zn)
}

fn anticausal_init(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    (z / (z * z - 1.0)) * (z * c[n - 2] + c[n - 1])
}

/// Replace samples by their interpolating B-spline coefficients in place.
fn prefilter_line(c: &mut [f64], degree: usize) {
    let n = c.len();
    if n < 2 {
        return;
    }
    let poles = poles(degree);
    let gain: f64 = poles.iter().map(|&z| (1.0 - z) * (1.0 - 1.0 / z)).product();
    c.iter_mut().for_each(|v| *v *= gain);

    for &z in poles {
        c[0] = causal_init(c, z);
        for k in 1..n {
            c[k] += z * c[k - 1];
        }
        c[n - 1] = anticausal_init(c, z);
        for k in (0..n - 1).rev() {
            c[k] = z * (c[k + 1] - c[k]);
        }
    }
}

/// B-spline coefficients of `grid` for interpolation of `degree`, filtering
/// along both axes.
pub fn spline_coefficients(grid: &ArrayView2<f64>, degree: usize) -> Array2<f64> {
    let mut coefficients = grid.to_owned();
    for axis in [Axis(0), Axis(1)] {
        let mut line = Vec::with_capacity(coefficients.len_of(axis));
        for mut lane in coefficients.lanes_mut(axis) {
            line.clear();
            line.extend(lane.iter().copied());
            prefilter_line(&mut line, degree);
            lane.iter_mut().zip(&line).for_each(|(out, &v)| *out = v);
        }
    }
    coefficients
}

/// Evaluate the spline with `coefficients` at fractional `(row, col)`.
pub(crate) fn evaluate(coefficients: &ArrayView2<f64>, degree: usize, row: f64, col: f64) -> f64 {
    let (rows, cols) = coefficients.dim();
    let radius = (degree as f64 + 1.0) / 2.0;
    let r_first = (row - radius).floor() as isize;
    let c_first = (col - radius).floor() as isize;
    let taps = degree as isize + 2;

    let mut value = 0.0;
    for r in r_first..r_first + taps {
        let wr = basis(degree, row - r as f64);
        if wr == 0.0 {
            continue;
        }
        let ri = mirror_index(r, rows);
        for c in c_first..c_first + taps {
            let wc = basis(degree, col - c as f64);
            if wc == 0.0 {
                continue;
            }
            value += wr * wc * coefficients[[ri, mirror_index(c, cols)]];
        }
    }
    value
}
