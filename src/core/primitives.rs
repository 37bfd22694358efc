//! Tagged numeric types for the two logical axes and the pixel axis.
//!
//! Keeping bar indices, prices and pixel coordinates in distinct types stops
//! a price from being fed into a time projection (and vice versa).

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Pixel coordinate along one axis, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinate(pub f64);

impl Coordinate {
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for Coordinate {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

/// Position along the time axis measured in bars.
///
/// Whole values address a bar; fractional values address a position between
/// bar centres (freehand strokes, zoom anchors).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarIndex(pub f64);

impl BarIndex {
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Clamps negative indices to the first bar.
    #[must_use]
    pub fn non_negative(self) -> Self {
        if self.0 < 0.0 { Self(0.0) } else { self }
    }

    #[must_use]
    pub fn rounded(self) -> Self {
        Self(self.0.round())
    }
}

impl From<f64> for BarIndex {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i64> for BarIndex {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub f64);

impl Price {
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    pub fn from_decimal(value: Decimal) -> ChartResult<Self> {
        value
            .to_f64()
            .map(Self)
            .ok_or_else(|| ChartError::InvalidData("price cannot be represented as f64".to_owned()))
    }
}

impl From<f64> for Price {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

/// Anchor of a drawing in logical (bar index × price) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalPoint {
    pub time: BarIndex,
    pub price: Price,
}

impl LogicalPoint {
    #[must_use]
    pub fn new(time: impl Into<BarIndex>, price: impl Into<Price>) -> Self {
        Self {
            time: time.into(),
            price: price.into(),
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.time.0.is_finite() && self.price.0.is_finite()
    }

    /// Returns the point shifted by a logical delta, keeping the time axis
    /// non-negative.
    #[must_use]
    pub fn translated(self, delta_time: f64, delta_price: f64) -> Self {
        Self {
            time: BarIndex(self.time.0 + delta_time).non_negative(),
            price: Price(self.price.0 + delta_price),
        }
    }
}

impl fmt::Display for LogicalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time.0, self.price.0)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{BarIndex, LogicalPoint, Price};

    #[test]
    fn translated_point_never_goes_left_of_first_bar() {
        let point = LogicalPoint::new(2.0, 10.0).translated(-5.0, 1.5);
        assert_eq!(point.time, BarIndex(0.0));
        assert_eq!(point.price, Price(11.5));
    }

    #[test]
    fn decimal_price_converts_to_f64() {
        let price = Price::from_decimal(Decimal::new(12_345, 2)).expect("price");
        assert!((price.get() - 123.45).abs() <= 1e-12);
    }
}
