use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::LogicalPoint;
use crate::error::{ChartError, ChartResult};
use crate::render::Color;

pub const DEFAULT_FIB_RETRACEMENT_LEVELS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];
pub const DEFAULT_FIB_EXTENSION_LEVELS: [f64; 6] = [0.0, 0.618, 1.0, 1.272, 1.618, 2.618];
pub const DEFAULT_REGRESSION_DEVIATION: f64 = 2.0;

/// Opaque drawing identifier, unique for the lifetime of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawingId(pub u64);

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drawing-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawingState {
    Creating,
    Selected,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineDash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineDash {
    /// On/off lengths in CSS pixels; empty for a solid stroke.
    #[must_use]
    pub fn pattern(self) -> &'static [f64] {
        match self {
            Self::Solid => &[],
            Self::Dashed => &[6.0, 4.0],
            Self::Dotted => &[1.5, 3.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingStyle {
    pub color: Color,
    pub line_width: f64,
    pub dash: LineDash,
    pub fill_color: Option<Color>,
    pub fill_opacity: f64,
}

impl Default for DrawingStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0.161, 0.384, 1.0),
            line_width: 2.0,
            dash: LineDash::Solid,
            fill_color: None,
            fill_opacity: 0.2,
        }
    }
}

impl DrawingStyle {
    pub fn validate(self) -> ChartResult<Self> {
        self.color.validate()?;
        if let Some(fill) = self.fill_color {
            fill.validate()?;
        }
        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(ChartError::InvalidData(
                "line width must be finite and > 0".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fill_opacity) {
            return Err(ChartError::InvalidData(
                "fill opacity must be in [0, 1]".to_owned(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowDirection {
    Up,
    Down,
}

/// How many anchors a variant needs before it is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Accepts points until a finish gesture, needs at least `min`.
    OpenEnded { min: usize },
}

impl Arity {
    #[must_use]
    pub fn is_satisfied_by(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::OpenEnded { min } => count >= min,
        }
    }
}

/// Closed set of drawing variants with their persisted variant scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DrawingKind {
    TrendLine,
    Ray,
    ExtendedLine,
    HorizontalLine,
    VerticalLine,
    HorizontalRay,
    CrossLine,
    InfoLine,
    TrendAngle,
    ParallelChannel,
    RegressionChannel { deviation_multiplier: f64 },
    FibRetracement { levels: Vec<f64>, extend_right: bool },
    FibExtension { levels: Vec<f64> },
    FibChannel { levels: Vec<f64> },
    Rectangle,
    RotatedRectangle,
    Ellipse,
    Triangle,
    Arc,
    Circle,
    Polyline,
    Path,
    Brush,
    Highlighter,
    Arrow,
    ArrowMarker,
    ArrowIcon { direction: ArrowDirection },
    Sticker { sticker: String },
}

impl DrawingKind {
    #[must_use]
    pub fn regression_channel() -> Self {
        Self::RegressionChannel {
            deviation_multiplier: DEFAULT_REGRESSION_DEVIATION,
        }
    }

    #[must_use]
    pub fn fib_retracement() -> Self {
        Self::FibRetracement {
            levels: DEFAULT_FIB_RETRACEMENT_LEVELS.to_vec(),
            extend_right: false,
        }
    }

    #[must_use]
    pub fn fib_extension() -> Self {
        Self::FibExtension {
            levels: DEFAULT_FIB_EXTENSION_LEVELS.to_vec(),
        }
    }

    #[must_use]
    pub fn fib_channel() -> Self {
        Self::FibChannel {
            levels: DEFAULT_FIB_RETRACEMENT_LEVELS.to_vec(),
        }
    }

    /// Every variant with default scalars, in toolbar order.
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        vec![
            Self::TrendLine,
            Self::Ray,
            Self::ExtendedLine,
            Self::HorizontalLine,
            Self::VerticalLine,
            Self::HorizontalRay,
            Self::CrossLine,
            Self::InfoLine,
            Self::TrendAngle,
            Self::ParallelChannel,
            Self::regression_channel(),
            Self::fib_retracement(),
            Self::fib_extension(),
            Self::fib_channel(),
            Self::Rectangle,
            Self::RotatedRectangle,
            Self::Ellipse,
            Self::Triangle,
            Self::Arc,
            Self::Circle,
            Self::Polyline,
            Self::Path,
            Self::Brush,
            Self::Highlighter,
            Self::Arrow,
            Self::ArrowMarker,
            Self::ArrowIcon {
                direction: ArrowDirection::Up,
            },
            Self::Sticker {
                sticker: "star".to_owned(),
            },
        ]
    }

    /// Discriminant used by the persisted record's `type` field.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TrendLine => "trendLine",
            Self::Ray => "ray",
            Self::ExtendedLine => "extendedLine",
            Self::HorizontalLine => "horizontalLine",
            Self::VerticalLine => "verticalLine",
            Self::HorizontalRay => "horizontalRay",
            Self::CrossLine => "crossLine",
            Self::InfoLine => "infoLine",
            Self::TrendAngle => "trendAngle",
            Self::ParallelChannel => "parallelChannel",
            Self::RegressionChannel { .. } => "regressionChannel",
            Self::FibRetracement { .. } => "fibRetracement",
            Self::FibExtension { .. } => "fibExtension",
            Self::FibChannel { .. } => "fibChannel",
            Self::Rectangle => "rectangle",
            Self::RotatedRectangle => "rotatedRectangle",
            Self::Ellipse => "ellipse",
            Self::Triangle => "triangle",
            Self::Arc => "arc",
            Self::Circle => "circle",
            Self::Polyline => "polyline",
            Self::Path => "path",
            Self::Brush => "brush",
            Self::Highlighter => "highlighter",
            Self::Arrow => "arrow",
            Self::ArrowMarker => "arrowMarker",
            Self::ArrowIcon { .. } => "arrowIcon",
            Self::Sticker { .. } => "sticker",
        }
    }

    #[must_use]
    pub fn arity(&self) -> Arity {
        match self {
            Self::HorizontalLine
            | Self::VerticalLine
            | Self::HorizontalRay
            | Self::CrossLine
            | Self::ArrowIcon { .. }
            | Self::Sticker { .. } => Arity::Exact(1),
            Self::TrendLine
            | Self::Ray
            | Self::ExtendedLine
            | Self::InfoLine
            | Self::TrendAngle
            | Self::RegressionChannel { .. }
            | Self::FibRetracement { .. }
            | Self::Rectangle
            | Self::Circle
            | Self::Arrow
            | Self::ArrowMarker => Arity::Exact(2),
            Self::ParallelChannel
            | Self::FibExtension { .. }
            | Self::FibChannel { .. }
            | Self::RotatedRectangle
            | Self::Ellipse
            | Self::Triangle
            | Self::Arc => Arity::Exact(3),
            Self::Polyline | Self::Path | Self::Brush | Self::Highlighter => {
                Arity::OpenEnded { min: 2 }
            }
        }
    }

    /// Press-drag-release strokes sampled from pointer moves.
    #[must_use]
    pub fn is_freehand(&self) -> bool {
        matches!(self, Self::Path | Self::Brush | Self::Highlighter)
    }

    #[must_use]
    pub fn is_open_ended(&self) -> bool {
        matches!(self.arity(), Arity::OpenEnded { .. })
    }

    /// Closed outlines that can carry a fill.
    #[must_use]
    pub fn is_closed_shape(&self) -> bool {
        matches!(
            self,
            Self::Rectangle | Self::RotatedRectangle | Self::Ellipse | Self::Triangle | Self::Circle
        )
    }

    #[must_use]
    pub fn default_style(&self) -> DrawingStyle {
        let base = DrawingStyle::default();
        match self {
            Self::Highlighter => DrawingStyle {
                color: Color::rgba(1.0, 0.92, 0.23, 0.4),
                line_width: 14.0,
                ..base
            },
            Self::ParallelChannel | Self::RegressionChannel { .. } | Self::FibChannel { .. } => {
                DrawingStyle {
                    fill_color: Some(base.color),
                    fill_opacity: 0.1,
                    ..base
                }
            }
            Self::Rectangle
            | Self::RotatedRectangle
            | Self::Ellipse
            | Self::Triangle
            | Self::Circle => DrawingStyle {
                fill_color: Some(base.color),
                ..base
            },
            Self::InfoLine | Self::TrendAngle => DrawingStyle {
                dash: LineDash::Dashed,
                ..base
            },
            _ => base,
        }
    }

    fn validate_scalars(&self) -> ChartResult<()> {
        match self {
            Self::RegressionChannel {
                deviation_multiplier,
            } if !deviation_multiplier.is_finite() || *deviation_multiplier < 0.0 => Err(
                ChartError::InvalidRecord("deviation multiplier must be finite and >= 0".to_owned()),
            ),
            Self::FibRetracement { levels, .. }
            | Self::FibExtension { levels }
            | Self::FibChannel { levels }
                if levels.iter().any(|level| !level.is_finite()) =>
            {
                Err(ChartError::InvalidRecord(
                    "fibonacci levels must be finite".to_owned(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// One annotation anchored in logical space.
///
/// Pure data: pixel geometry derived from it lives in
/// [`GeometryCache`](crate::drawing::GeometryCache).
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub id: DrawingId,
    pub kind: DrawingKind,
    pub points: Vec<LogicalPoint>,
    pub style: DrawingStyle,
    pub state: DrawingState,
    pub visible: bool,
    pub locked: bool,
}

impl Drawing {
    /// Starts a drawing in the `Creating` state with no points.
    #[must_use]
    pub fn new(id: DrawingId, kind: DrawingKind) -> Self {
        Self {
            id,
            style: kind.default_style(),
            kind,
            points: Vec::new(),
            state: DrawingState::Creating,
            visible: true,
            locked: false,
        }
    }

    /// Builds an already complete drawing, checking its arity.
    pub fn complete(
        id: DrawingId,
        kind: DrawingKind,
        points: Vec<LogicalPoint>,
    ) -> ChartResult<Self> {
        let mut drawing = Self::new(id, kind);
        drawing.points = points;
        drawing.state = DrawingState::Complete;
        drawing.validate()?;
        Ok(drawing)
    }

    #[must_use]
    pub fn with_style(mut self, style: DrawingStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, DrawingState::Complete | DrawingState::Selected)
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.state == DrawingState::Selected
    }

    /// Checks the invariants a persisted or host-supplied drawing must hold.
    pub fn validate(&self) -> ChartResult<()> {
        if let Some(point) = self
            .points
            .iter()
            .find(|point| !point.is_finite() || point.time.get() < 0.0)
        {
            return Err(ChartError::InvalidRecord(format!(
                "point {point} must be finite with a non-negative bar index"
            )));
        }
        if self.is_complete() && !self.kind.arity().is_satisfied_by(self.points.len()) {
            return Err(ChartError::InvalidRecord(format!(
                "{} needs {:?} points, got {}",
                self.kind.type_name(),
                self.kind.arity(),
                self.points.len()
            )));
        }
        self.kind.validate_scalars()?;
        self.style.validate()?;
        Ok(())
    }

    /// Moves every anchor by a logical delta.
    ///
    /// The time delta is clamped once so the leftmost anchor stops at bar 0
    /// and the shape is preserved.
    pub fn translate(&mut self, delta_time: f64, delta_price: f64) -> ChartResult<()> {
        self.ensure_unlocked()?;
        if !delta_time.is_finite() || !delta_price.is_finite() {
            return Ok(());
        }
        let min_time = self
            .points
            .iter()
            .map(|point| point.time.get())
            .fold(f64::INFINITY, f64::min);
        let delta_time = if min_time.is_finite() {
            delta_time.max(-min_time)
        } else {
            delta_time
        };
        for point in &mut self.points {
            *point = point.translated(delta_time, delta_price);
        }
        Ok(())
    }

    /// Moves one editable handle to `point`.
    ///
    /// Handles map to anchors one to one, except for rectangles whose
    /// handles 2 and 3 are the derived corners sharing coordinates with both
    /// anchors.
    pub fn move_control_point(&mut self, index: usize, point: LogicalPoint) -> ChartResult<()> {
        self.ensure_unlocked()?;
        if !point.is_finite() {
            return Ok(());
        }
        let point = LogicalPoint {
            time: point.time.non_negative(),
            price: point.price,
        };
        match (&self.kind, index) {
            (DrawingKind::Rectangle, 2) if self.points.len() == 2 => {
                self.points[0].time = point.time;
                self.points[1].price = point.price;
            }
            (DrawingKind::Rectangle, 3) if self.points.len() == 2 => {
                self.points[1].time = point.time;
                self.points[0].price = point.price;
            }
            _ => match self.points.get_mut(index) {
                Some(anchor) => *anchor = point,
                None => {
                    return Err(ChartError::InvalidData(format!(
                        "control point {index} out of range for {}",
                        self.id
                    )));
                }
            },
        }
        Ok(())
    }

    fn ensure_unlocked(&self) -> ChartResult<()> {
        if self.locked {
            return Err(ChartError::DrawingLocked(self.id.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Arity, Drawing, DrawingId, DrawingKind, DrawingState};
    use crate::core::LogicalPoint;
    use crate::error::ChartError;

    #[test]
    fn catalog_covers_every_arity_class() {
        let catalog = DrawingKind::catalog();
        assert_eq!(catalog.len(), 28);
        assert!(catalog.iter().any(|kind| kind.arity() == Arity::Exact(1)));
        assert!(catalog.iter().any(|kind| kind.arity() == Arity::Exact(3)));
        assert!(catalog.iter().any(DrawingKind::is_open_ended));
    }

    #[test]
    fn complete_rejects_wrong_arity() {
        let err = Drawing::complete(
            DrawingId(1),
            DrawingKind::TrendLine,
            vec![LogicalPoint::new(1.0, 2.0)],
        )
        .expect_err("one point is not a trend line");
        assert!(matches!(err, ChartError::InvalidRecord(_)));
    }

    #[test]
    fn locked_drawing_rejects_translate_but_keeps_points() {
        let mut drawing = Drawing::complete(
            DrawingId(7),
            DrawingKind::Ray,
            vec![LogicalPoint::new(1.0, 2.0), LogicalPoint::new(3.0, 4.0)],
        )
        .expect("ray");
        drawing.locked = true;
        assert!(matches!(
            drawing.translate(1.0, 1.0),
            Err(ChartError::DrawingLocked(7))
        ));
        assert_eq!(drawing.points[0], LogicalPoint::new(1.0, 2.0));
        assert_eq!(drawing.state, DrawingState::Complete);
    }

    #[test]
    fn rectangle_derived_corner_updates_both_anchors() {
        let mut drawing = Drawing::complete(
            DrawingId(2),
            DrawingKind::Rectangle,
            vec![LogicalPoint::new(10.0, 100.0), LogicalPoint::new(20.0, 50.0)],
        )
        .expect("rectangle");
        drawing
            .move_control_point(2, LogicalPoint::new(12.0, 60.0))
            .expect("corner");
        assert_eq!(drawing.points[0], LogicalPoint::new(12.0, 100.0));
        assert_eq!(drawing.points[1], LogicalPoint::new(20.0, 60.0));
    }
}
