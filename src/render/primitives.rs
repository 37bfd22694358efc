use serde::{Deserialize, Serialize};

use crate::core::PixelPoint;
use crate::error::{ChartError, ChartResult};

/// RGBA color in normalized 0..=1 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn validate(self) -> ChartResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChartError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// One stroked segment in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePrimitive {
    pub from: PixelPoint,
    pub to: PixelPoint,
    pub stroke_width: f64,
    pub color: Color,
    pub dash: &'static [f64],
}

impl LinePrimitive {
    pub fn validate(self) -> ChartResult<()> {
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(ChartError::InvalidData(
                "line coordinates must be finite".to_owned(),
            ));
        }
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 {
            return Err(ChartError::InvalidData(
                "line stroke width must be finite and > 0".to_owned(),
            ));
        }
        self.color.validate()
    }
}

/// Closed filled outline in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FillPrimitive {
    pub outline: Vec<PixelPoint>,
    pub color: Color,
}

impl FillPrimitive {
    pub fn validate(&self) -> ChartResult<()> {
        if self.outline.len() < 3 {
            return Err(ChartError::InvalidData(
                "fill outline needs at least three points".to_owned(),
            ));
        }
        if self.outline.iter().any(|point| !point.is_finite()) {
            return Err(ChartError::InvalidData(
                "fill coordinates must be finite".to_owned(),
            ));
        }
        self.color.validate()
    }
}

/// Square drag handle drawn on a selected drawing's control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlePrimitive {
    pub center: PixelPoint,
    pub half_size: f64,
    pub color: Color,
}

impl HandlePrimitive {
    pub fn validate(self) -> ChartResult<()> {
        if !self.center.is_finite() || !self.half_size.is_finite() || self.half_size <= 0.0 {
            return Err(ChartError::InvalidData(
                "handle must have a finite center and positive size".to_owned(),
            ));
        }
        self.color.validate()
    }
}
