//! Interpolation order selection

use serde::{Deserialize, Serialize};

use crate::error::ImageUtilError;

/// Highest spline order accepted by the resampler.
pub const MAX_ORDER: i32 = 5;

/// Interpolation order for point sampling.
///
/// Orders follow the usual spline numbering: 0 samples the nearest pixel,
/// 1 is bilinear, and orders 2 through [`MAX_ORDER`] are interpolating
/// B-splines of that degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum InterpolationOrder {
    Nearest,
    Linear,
    Spline(u8),
}

impl InterpolationOrder {
    /// Validate a raw order, rejecting negatives and anything above [`MAX_ORDER`].
    pub fn new(order: i32) -> Result<Self, ImageUtilError> {
        match order {
            0 => Ok(Self::Nearest),
            1 => Ok(Self::Linear),
            2..=MAX_ORDER => Ok(Self::Spline(order as u8)),
            _ => Err(ImageUtilError::InvalidOrder(order)),
        }
    }

    /// Numeric order as originally requested
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Nearest => 0,
            Self::Linear => 1,
            Self::Spline(order) => *order as i32,
        }
    }
}

impl Default for InterpolationOrder {
    fn default() -> Self {
        Self::Linear
    }
}

impl TryFrom<i32> for InterpolationOrder {
    type Error = ImageUtilError;

    fn try_from(order: i32) -> Result<Self, Self::Error> {
        Self::new(order)
    }
}

impl From<InterpolationOrder> for i32 {
    fn from(order: InterpolationOrder) -> Self {
        order.as_i32()
    }
}
