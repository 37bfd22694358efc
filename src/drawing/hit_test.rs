use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::PixelPoint;
use crate::drawing::geometry::{
    distance_to_polygon_outline, distance_to_polyline, distance_to_segment, polygon_contains,
};
use crate::drawing::model::DrawingId;
use crate::drawing::projection::{DrawingGeometry, ELLIPSE_SEGMENTS, Shape};

fn default_threshold_px() -> f64 {
    6.0
}

/// Pointer tolerance in CSS pixels, independent of the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitTestConfig {
    #[serde(default = "default_threshold_px")]
    pub threshold_px: f64,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            threshold_px: default_threshold_px(),
        }
    }
}

impl HitTestConfig {
    /// Body tolerance for a stroke of `line_width`.
    #[must_use]
    pub fn body_tolerance(self, line_width: f64) -> f64 {
        self.threshold_px + line_width.max(0.0) * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitPart {
    ControlPoint(usize),
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitTarget {
    pub id: DrawingId,
    pub part: HitPart,
}

/// Nearest control point within the threshold.
#[must_use]
pub fn hit_control_point(
    geometry: &DrawingGeometry,
    point: PixelPoint,
    config: HitTestConfig,
) -> Option<usize> {
    geometry
        .control_points
        .iter()
        .enumerate()
        .map(|(index, handle)| (index, handle.distance_to(point)))
        .filter(|(_, distance)| *distance <= config.threshold_px)
        .min_by_key(|(_, distance)| OrderedFloat(*distance))
        .map(|(index, _)| index)
}

/// Whether `point` touches any stroke of the drawing or the inside of a
/// filled shape.
#[must_use]
pub fn hit_body(geometry: &DrawingGeometry, point: PixelPoint, config: HitTestConfig) -> bool {
    let tolerance = config.body_tolerance(geometry.line_width);
    geometry.shapes.iter().any(|shape| match shape {
        Shape::Segment { from, to } => distance_to_segment(point, *from, *to) <= tolerance,
        Shape::Polyline(points) => {
            distance_to_polyline(point, points).is_some_and(|distance| distance <= tolerance)
        }
        Shape::Polygon { points, filled } => {
            (*filled && polygon_contains(points, point))
                || distance_to_polygon_outline(point, points)
                    .is_some_and(|distance| distance <= tolerance)
        }
        Shape::Ellipse { ellipse, filled } => {
            (*filled && ellipse.implicit(point).is_some_and(|value| value <= 1.0))
                || distance_to_polygon_outline(point, &ellipse.outline(ELLIPSE_SEGMENTS))
                    .is_some_and(|distance| distance <= tolerance)
        }
        Shape::Icon { center, half_size } => {
            let reach = half_size + config.threshold_px;
            (point.x - center.x).abs() <= reach && (point.y - center.y).abs() <= reach
        }
    })
}

/// Control points win over the body of the same drawing.
#[must_use]
pub fn hit_drawing(
    id: DrawingId,
    geometry: &DrawingGeometry,
    point: PixelPoint,
    config: HitTestConfig,
) -> Option<HitTarget> {
    if let Some(index) = hit_control_point(geometry, point, config) {
        return Some(HitTarget {
            id,
            part: HitPart::ControlPoint(index),
        });
    }
    hit_body(geometry, point, config).then_some(HitTarget {
        id,
        part: HitPart::Body,
    })
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::{HitPart, HitTestConfig, hit_body, hit_drawing};
    use crate::core::PixelPoint;
    use crate::drawing::geometry::EllipseParams;
    use crate::drawing::model::DrawingId;
    use crate::drawing::projection::{DrawingGeometry, Shape};

    fn segment_geometry(line_width: f64) -> DrawingGeometry {
        let from = PixelPoint::new(0.0, 0.0);
        let to = PixelPoint::new(100.0, 0.0);
        DrawingGeometry {
            control_points: smallvec![from, to],
            shapes: vec![Shape::Segment { from, to }],
            line_width,
            ..DrawingGeometry::default()
        }
    }

    #[test]
    fn control_point_beats_body() {
        let geometry = segment_geometry(2.0);
        let target = hit_drawing(
            DrawingId(1),
            &geometry,
            PixelPoint::new(2.0, 1.0),
            HitTestConfig::default(),
        )
        .expect("hit");
        assert_eq!(target.part, HitPart::ControlPoint(0));

        let target = hit_drawing(
            DrawingId(1),
            &geometry,
            PixelPoint::new(50.0, 1.0),
            HitTestConfig::default(),
        )
        .expect("hit");
        assert_eq!(target.part, HitPart::Body);
    }

    #[test]
    fn tolerance_grows_with_line_width() {
        let config = HitTestConfig::default();
        let probe = PixelPoint::new(50.0, 9.5);
        assert!(!hit_body(&segment_geometry(2.0), probe, config));
        assert!(hit_body(&segment_geometry(8.0), probe, config));
    }

    #[test]
    fn filled_ellipse_hits_inside() {
        let ellipse = EllipseParams {
            center: PixelPoint::new(50.0, 50.0),
            radius_x: 40.0,
            radius_y: 20.0,
            rotation: 0.0,
        };
        let centre = PixelPoint::new(50.0, 50.0);
        let config = HitTestConfig::default();
        let mut geometry = DrawingGeometry {
            shapes: vec![Shape::Ellipse {
                ellipse,
                filled: false,
            }],
            line_width: 1.0,
            ..DrawingGeometry::default()
        };
        assert!(!hit_body(&geometry, centre, config));
        assert!(hit_body(&geometry, PixelPoint::new(90.0, 50.0), config));
        geometry.shapes = vec![Shape::Ellipse {
            ellipse,
            filled: true,
        }];
        assert!(hit_body(&geometry, centre, config));
    }
}
