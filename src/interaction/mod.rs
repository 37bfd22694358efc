use serde::{Deserialize, Serialize};

use crate::core::{LogicalPoint, PixelPoint};
use crate::drawing::DrawingId;
use crate::error::{ChartError, ChartResult};

/// Pointer drag state of a chart surface.
///
/// Each event handler consumes the current value and yields the next one;
/// nothing else records whether a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Panning,
    ScalingPrice,
    DraggingDrawing {
        id: DrawingId,
        /// `None` drags the whole drawing.
        control_point: Option<usize>,
        /// Logical pointer position at the previous update.
        last: LogicalPoint,
    },
}

impl InteractionState {
    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    #[must_use]
    pub fn dragged_drawing(self) -> Option<DrawingId> {
        match self {
            Self::DraggingDrawing { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Pointer position in canvas-relative CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn position(self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub x: f64,
    pub y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    /// Set by trackpad pinch gestures.
    #[serde(default)]
    pub ctrl_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelAction {
    Zoom { x: f64, scale: f64 },
    Scroll { delta_px: f64 },
    Ignore,
}

impl WheelEvent {
    /// Maps a wheel event onto a time-scale operation.
    ///
    /// Pinch zoom is proportional to `delta_y`; a plain wheel zooms one step
    /// per notch. Horizontal wheels scroll.
    #[must_use]
    pub fn resolve(self, config: InteractionConfig) -> WheelAction {
        if !self.x.is_finite() || !self.delta_x.is_finite() || !self.delta_y.is_finite() {
            return WheelAction::Ignore;
        }
        if self.ctrl_key {
            if self.delta_y == 0.0 {
                return WheelAction::Ignore;
            }
            return WheelAction::Zoom {
                x: self.x,
                scale: -self.delta_y / config.wheel_zoom_divisor,
            };
        }
        if self.delta_x.abs() > self.delta_y.abs() {
            WheelAction::Scroll {
                delta_px: -self.delta_x,
            }
        } else if self.delta_y != 0.0 {
            WheelAction::Zoom {
                x: self.x,
                scale: -self.delta_y.signum(),
            }
        } else {
            WheelAction::Ignore
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Enter,
}

fn default_wheel_zoom_divisor() -> f64 {
    10.0
}

fn default_freehand_min_step_px() -> f64 {
    2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "default_wheel_zoom_divisor")]
    pub wheel_zoom_divisor: f64,
    #[serde(default = "default_freehand_min_step_px")]
    pub freehand_min_step_px: f64,
    #[serde(default)]
    pub continuous_drawing: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_divisor: default_wheel_zoom_divisor(),
            freehand_min_step_px: default_freehand_min_step_px(),
            continuous_drawing: false,
        }
    }
}

impl InteractionConfig {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.wheel_zoom_divisor.is_finite() || self.wheel_zoom_divisor <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "wheel zoom divisor must be finite and > 0".to_owned(),
            ));
        }
        if !self.freehand_min_step_px.is_finite() || self.freehand_min_step_px < 0.0 {
            return Err(ChartError::InvalidConfig(
                "freehand min step must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{InteractionConfig, WheelAction, WheelEvent};

    fn wheel(delta_x: f64, delta_y: f64, ctrl_key: bool) -> WheelEvent {
        WheelEvent {
            x: 300.0,
            y: 100.0,
            delta_x,
            delta_y,
            ctrl_key,
        }
    }

    #[test]
    fn pinch_zoom_is_proportional() {
        let action = wheel(0.0, -5.0, true).resolve(InteractionConfig::default());
        assert_eq!(action, WheelAction::Zoom { x: 300.0, scale: 0.5 });
    }

    #[test]
    fn plain_wheel_zooms_one_step_and_horizontal_scrolls() {
        let config = InteractionConfig::default();
        assert_eq!(
            wheel(0.0, 120.0, false).resolve(config),
            WheelAction::Zoom { x: 300.0, scale: -1.0 }
        );
        assert_eq!(
            wheel(40.0, 3.0, false).resolve(config),
            WheelAction::Scroll { delta_px: -40.0 }
        );
        assert_eq!(wheel(0.0, 0.0, false).resolve(config), WheelAction::Ignore);
    }
}
