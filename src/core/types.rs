use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Point in CSS pixel space, origin at the top-left of the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: PixelPoint) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn dot(self, other: PixelPoint) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 2D cross product.
    #[must_use]
    pub fn cross(self, other: PixelPoint) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[must_use]
    pub fn midpoint(self, other: PixelPoint) -> PixelPoint {
        PixelPoint::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for PixelPoint {
    type Output = PixelPoint;

    fn add(self, rhs: PixelPoint) -> PixelPoint {
        PixelPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PixelPoint {
    type Output = PixelPoint;

    fn sub(self, rhs: PixelPoint) -> PixelPoint {
        PixelPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for PixelPoint {
    type Output = PixelPoint;

    fn mul(self, rhs: f64) -> PixelPoint {
        PixelPoint::new(self.x * rhs, self.y * rhs)
    }
}

/// Mapping from CSS pixels to backing-store pixels.
///
/// Hit-testing and the geometry cache stay in CSS pixels; only frame building
/// crosses into device space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceTransform {
    pub pixel_ratio: f64,
}

impl Default for DeviceTransform {
    fn default() -> Self {
        Self { pixel_ratio: 1.0 }
    }
}

impl DeviceTransform {
    #[must_use]
    pub fn new(pixel_ratio: f64) -> Self {
        if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            Self { pixel_ratio }
        } else {
            Self::default()
        }
    }

    #[must_use]
    pub fn to_device(self, point: PixelPoint) -> PixelPoint {
        point * self.pixel_ratio
    }

    #[must_use]
    pub fn scale_length(self, length: f64) -> f64 {
        length * self.pixel_ratio
    }
}
