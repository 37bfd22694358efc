//! Logical → pixel projection of drawings and the render-scoped geometry cache.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::core::{
    BarIndex, BarSource, DeviceTransform, LogicalPoint, PixelPoint, Price, PriceScale, TimeScale,
};
use crate::drawing::geometry::{
    EllipseParams, RegressionLine, angle_degrees, arc_through_points, arrow_head,
    clip_line_to_viewport, ellipse_through_points, linear_regression, perpendicular_offset,
    rotated_rectangle_corners,
};
use crate::drawing::model::{ArrowDirection, Drawing, DrawingId, DrawingKind};

pub const ARROW_HEAD_LENGTH_PX: f64 = 12.0;
pub const ARROW_MARKER_HEAD_LENGTH_PX: f64 = 16.0;
pub const ARROW_ICON_HALF_SIZE_PX: f64 = 8.0;
pub const STICKER_HALF_SIZE_PX: f64 = 16.0;
pub const ARC_SEGMENTS: usize = 32;
pub const ELLIPSE_SEGMENTS: usize = 64;
const TREND_ANGLE_REFERENCE_PX: f64 = 40.0;

/// Read-only view of the coordinate engine used to project one frame.
#[derive(Clone, Copy)]
pub struct Projection<'a> {
    time_scale: &'a TimeScale,
    price_scale: &'a PriceScale,
    device: DeviceTransform,
    bars: Option<&'a dyn BarSource>,
}

impl<'a> Projection<'a> {
    #[must_use]
    pub fn new(time_scale: &'a TimeScale, price_scale: &'a PriceScale) -> Self {
        Self {
            time_scale,
            price_scale,
            device: DeviceTransform::default(),
            bars: None,
        }
    }

    #[must_use]
    pub fn with_device(mut self, device: DeviceTransform) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn with_bars(mut self, bars: &'a dyn BarSource) -> Self {
        self.bars = Some(bars);
        self
    }

    #[must_use]
    pub fn device(&self) -> DeviceTransform {
        self.device
    }

    #[must_use]
    pub fn time_scale(&self) -> &'a TimeScale {
        self.time_scale
    }

    #[must_use]
    pub fn price_scale(&self) -> &'a PriceScale {
        self.price_scale
    }

    /// Plot area size in CSS pixels.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        (self.time_scale.width(), self.price_scale.height())
    }

    #[must_use]
    pub fn to_pixel(&self, point: LogicalPoint) -> PixelPoint {
        PixelPoint::new(
            self.time_scale.index_to_coordinate(point.time).get(),
            self.price_scale.price_to_coordinate(point.price).get(),
        )
    }

    /// Inverse projection. `snap` rounds to the nearest whole bar; negative
    /// bar indices clamp to 0 either way.
    #[must_use]
    pub fn to_logical(&self, pixel: PixelPoint, snap: bool) -> LogicalPoint {
        let time = self.time_scale.coordinate_to_float_index(pixel.x);
        let time = if snap { time.rounded() } else { time };
        LogicalPoint {
            time: time.non_negative(),
            price: self.price_scale.coordinate_to_price(pixel.y),
        }
    }

    fn price_y(&self, price: f64) -> f64 {
        self.price_scale.price_to_coordinate(Price(price)).get()
    }

    fn index_x(&self, index: f64) -> f64 {
        self.time_scale.index_to_coordinate(BarIndex(index)).get()
    }
}

/// One primitive outline in CSS pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Segment { from: PixelPoint, to: PixelPoint },
    Polyline(Vec<PixelPoint>),
    Polygon { points: Vec<PixelPoint>, filled: bool },
    Ellipse { ellipse: EllipseParams, filled: bool },
    Icon { center: PixelPoint, half_size: f64 },
}

impl Shape {
    fn segment(from: PixelPoint, to: PixelPoint) -> Self {
        Self::Segment { from, to }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfoLineStats {
    pub bar_count: i64,
    pub price_change: f64,
    /// `None` when the start price is zero.
    pub percent_change: Option<f64>,
    pub pixel_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub level: f64,
    /// Only price-aligned studies carry a price; channel levels are slanted.
    pub price: Option<f64>,
    pub from: PixelPoint,
    pub to: PixelPoint,
}

/// Variant-specific derived values, recomputed on every rebuild.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum GeometryDetails {
    #[default]
    None,
    InfoLine(InfoLineStats),
    TrendAngle { degrees: f64 },
    /// Fit in (bar index, price) space.
    Regression(RegressionLine),
    FibLevels(Vec<FibLevel>),
}

/// Pixel geometry of one drawing for the current scale state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawingGeometry {
    pub control_points: SmallVec<[PixelPoint; 4]>,
    pub shapes: Vec<Shape>,
    pub line_width: f64,
    pub details: GeometryDetails,
}

impl DrawingGeometry {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.control_points.is_empty()
    }

    /// Number of stroked segments, counting polyline and outline edges.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.shapes
            .iter()
            .map(|shape| match shape {
                Shape::Segment { .. } => 1,
                Shape::Polyline(points) => points.len().saturating_sub(1),
                Shape::Polygon { points, .. } => points.len(),
                Shape::Ellipse { .. } => ELLIPSE_SEGMENTS,
                Shape::Icon { .. } => 4,
            })
            .sum()
    }
}

/// Projects a drawing with however many points it currently has.
///
/// In-progress drawings get preview geometry for their partial anchors.
#[must_use]
pub fn project_drawing(drawing: &Drawing, projection: &Projection<'_>) -> DrawingGeometry {
    let pixels: SmallVec<[PixelPoint; 4]> = drawing
        .points
        .iter()
        .map(|point| projection.to_pixel(*point))
        .collect();
    let mut geometry = DrawingGeometry {
        control_points: pixels.clone(),
        shapes: Vec::new(),
        line_width: drawing.style.line_width,
        details: GeometryDetails::None,
    };
    let Some(&p0) = pixels.first() else {
        return geometry;
    };
    let (width, height) = projection.bounds();
    let filled = drawing.style.fill_color.is_some();
    let shapes = &mut geometry.shapes;

    match &drawing.kind {
        DrawingKind::HorizontalLine => {
            shapes.push(Shape::segment(
                PixelPoint::new(0.0, p0.y),
                PixelPoint::new(width, p0.y),
            ));
        }
        DrawingKind::VerticalLine => {
            shapes.push(Shape::segment(
                PixelPoint::new(p0.x, 0.0),
                PixelPoint::new(p0.x, height),
            ));
        }
        DrawingKind::HorizontalRay => {
            shapes.push(Shape::segment(p0, PixelPoint::new(width.max(p0.x), p0.y)));
        }
        DrawingKind::CrossLine => {
            shapes.push(Shape::segment(
                PixelPoint::new(0.0, p0.y),
                PixelPoint::new(width, p0.y),
            ));
            shapes.push(Shape::segment(
                PixelPoint::new(p0.x, 0.0),
                PixelPoint::new(p0.x, height),
            ));
        }
        DrawingKind::ArrowIcon { direction } => {
            let h = ARROW_ICON_HALF_SIZE_PX;
            let (tip, base) = match direction {
                ArrowDirection::Up => (-h, h),
                ArrowDirection::Down => (h, -h),
            };
            shapes.push(Shape::Polygon {
                points: vec![
                    PixelPoint::new(p0.x, p0.y + tip),
                    PixelPoint::new(p0.x + h, p0.y + base),
                    PixelPoint::new(p0.x - h, p0.y + base),
                ],
                filled: true,
            });
        }
        DrawingKind::Sticker { .. } => {
            shapes.push(Shape::Icon {
                center: p0,
                half_size: STICKER_HALF_SIZE_PX,
            });
        }
        DrawingKind::Polyline | DrawingKind::Path | DrawingKind::Brush | DrawingKind::Highlighter => {
            if pixels.len() >= 2 {
                shapes.push(Shape::Polyline(pixels.to_vec()));
            }
            if drawing.kind.is_freehand() {
                // Strokes move as a whole; individual samples are not handles.
                geometry.control_points.clear();
            }
        }
        kind => {
            let Some(&p1) = pixels.get(1) else {
                return geometry;
            };
            let p2 = pixels.get(2).copied();
            project_multi_anchor(
                kind,
                drawing,
                projection,
                [p0, p1],
                p2,
                filled,
                &mut geometry,
            );
            return geometry;
        }
    }
    geometry
}

fn project_multi_anchor(
    kind: &DrawingKind,
    drawing: &Drawing,
    projection: &Projection<'_>,
    [p0, p1]: [PixelPoint; 2],
    p2: Option<PixelPoint>,
    filled: bool,
    geometry: &mut DrawingGeometry,
) {
    let (width, height) = projection.bounds();
    let shapes = &mut geometry.shapes;
    match kind {
        DrawingKind::TrendLine => shapes.push(Shape::segment(p0, p1)),
        DrawingKind::Ray => {
            if let Some((from, to)) = clip_line_to_viewport(p0, p1, false, true, width, height) {
                shapes.push(Shape::segment(from, to));
            }
        }
        DrawingKind::ExtendedLine => {
            if let Some((from, to)) = clip_line_to_viewport(p0, p1, true, true, width, height) {
                shapes.push(Shape::segment(from, to));
            }
        }
        DrawingKind::InfoLine => {
            shapes.push(Shape::segment(p0, p1));
            let (a, b) = (drawing.points[0], drawing.points[1]);
            let price_change = b.price.get() - a.price.get();
            geometry.details = GeometryDetails::InfoLine(InfoLineStats {
                bar_count: (b.time.get() - a.time.get()).round() as i64,
                price_change,
                percent_change: (a.price.get() != 0.0)
                    .then(|| price_change / a.price.get().abs() * 100.0),
                pixel_distance: p0.distance_to(p1),
            });
        }
        DrawingKind::TrendAngle => {
            shapes.push(Shape::segment(p0, p1));
            shapes.push(Shape::segment(
                p0,
                PixelPoint::new(p0.x + TREND_ANGLE_REFERENCE_PX, p0.y),
            ));
            geometry.details = GeometryDetails::TrendAngle {
                degrees: angle_degrees(p0, p1),
            };
        }
        DrawingKind::Arrow => {
            shapes.push(Shape::segment(p0, p1));
            if let Some([left, right]) = arrow_head(p0, p1, ARROW_HEAD_LENGTH_PX) {
                shapes.push(Shape::segment(p1, left));
                shapes.push(Shape::segment(p1, right));
            }
        }
        DrawingKind::ArrowMarker => {
            shapes.push(Shape::segment(p0, p1));
            if let Some([left, right]) = arrow_head(p0, p1, ARROW_MARKER_HEAD_LENGTH_PX) {
                shapes.push(Shape::Polygon {
                    points: vec![p1, left, right],
                    filled: true,
                });
            }
        }
        DrawingKind::ParallelChannel => match p2 {
            None => shapes.push(Shape::segment(p0, p1)),
            Some(p2) => {
                let offset = perpendicular_offset(p0, p1, p2);
                shapes.push(Shape::segment(p0, p1));
                shapes.push(Shape::segment(p0 + offset, p1 + offset));
                shapes.push(Shape::Polygon {
                    points: vec![p0, p1, p1 + offset, p0 + offset],
                    filled,
                });
            }
        },
        DrawingKind::RegressionChannel {
            deviation_multiplier,
        } => project_regression(drawing, projection, *deviation_multiplier, [p0, p1], geometry),
        DrawingKind::FibRetracement {
            levels,
            extend_right,
        } => {
            let (a, b) = (drawing.points[0].price.get(), drawing.points[1].price.get());
            let left = p0.x.min(p1.x);
            let right = if *extend_right { width.max(left) } else { p0.x.max(p1.x) };
            shapes.push(Shape::segment(p0, p1));
            let fib = levels
                .iter()
                .map(|&level| {
                    let price = b - (b - a) * level;
                    let y = projection.price_y(price);
                    FibLevel {
                        level,
                        price: Some(price),
                        from: PixelPoint::new(left, y),
                        to: PixelPoint::new(right, y),
                    }
                })
                .collect::<Vec<_>>();
            shapes.extend(fib.iter().map(|level| Shape::segment(level.from, level.to)));
            geometry.details = GeometryDetails::FibLevels(fib);
        }
        DrawingKind::FibExtension { levels } => match p2 {
            None => shapes.push(Shape::segment(p0, p1)),
            Some(p2) => {
                let (a, b) = (drawing.points[0].price.get(), drawing.points[1].price.get());
                let c = drawing.points[2].price.get();
                let left = p0.x.min(p1.x).min(p2.x);
                let right = p0.x.max(p1.x).max(p2.x);
                shapes.push(Shape::Polyline(vec![p0, p1, p2]));
                let fib = levels
                    .iter()
                    .map(|&level| {
                        let price = c + (b - a) * level;
                        let y = projection.price_y(price);
                        FibLevel {
                            level,
                            price: Some(price),
                            from: PixelPoint::new(left, y),
                            to: PixelPoint::new(right, y),
                        }
                    })
                    .collect::<Vec<_>>();
                shapes.extend(fib.iter().map(|level| Shape::segment(level.from, level.to)));
                geometry.details = GeometryDetails::FibLevels(fib);
            }
        },
        DrawingKind::FibChannel { levels } => match p2 {
            None => shapes.push(Shape::segment(p0, p1)),
            Some(p2) => {
                let offset = perpendicular_offset(p0, p1, p2);
                let fib = levels
                    .iter()
                    .map(|&level| FibLevel {
                        level,
                        price: None,
                        from: p0 + offset * level,
                        to: p1 + offset * level,
                    })
                    .collect::<Vec<_>>();
                shapes.extend(fib.iter().map(|level| Shape::segment(level.from, level.to)));
                shapes.push(Shape::Polygon {
                    points: vec![p0, p1, p1 + offset, p0 + offset],
                    filled,
                });
                geometry.details = GeometryDetails::FibLevels(fib);
            }
        },
        DrawingKind::Rectangle => {
            let corner_a = PixelPoint::new(p0.x, p1.y);
            let corner_b = PixelPoint::new(p1.x, p0.y);
            geometry.control_points.push(corner_a);
            geometry.control_points.push(corner_b);
            shapes.push(Shape::Polygon {
                points: vec![p0, corner_b, p1, corner_a],
                filled,
            });
        }
        DrawingKind::RotatedRectangle => {
            shapes.push(Shape::Polygon {
                points: rotated_rectangle_corners(p0, p1, p2).to_vec(),
                filled,
            });
        }
        DrawingKind::Ellipse => {
            if let Some(ellipse) = ellipse_through_points(p0, p1, p2) {
                shapes.push(Shape::Ellipse { ellipse, filled });
            }
        }
        DrawingKind::Triangle => match p2 {
            None => shapes.push(Shape::segment(p0, p1)),
            Some(p2) => shapes.push(Shape::Polygon {
                points: vec![p0, p1, p2],
                filled,
            }),
        },
        DrawingKind::Arc => match p2 {
            None => shapes.push(Shape::segment(p0, p1)),
            Some(p2) => shapes.push(Shape::Polyline(arc_through_points(p0, p1, p2, ARC_SEGMENTS))),
        },
        DrawingKind::Circle => {
            let radius = p0.distance_to(p1);
            if radius > f64::EPSILON {
                shapes.push(Shape::Ellipse {
                    ellipse: EllipseParams {
                        center: p0,
                        radius_x: radius,
                        radius_y: radius,
                        rotation: 0.0,
                    },
                    filled,
                });
            }
        }
        DrawingKind::HorizontalLine
        | DrawingKind::VerticalLine
        | DrawingKind::HorizontalRay
        | DrawingKind::CrossLine
        | DrawingKind::Polyline
        | DrawingKind::Path
        | DrawingKind::Brush
        | DrawingKind::Highlighter
        | DrawingKind::ArrowIcon { .. }
        | DrawingKind::Sticker { .. } => {}
    }
}

fn project_regression(
    drawing: &Drawing,
    projection: &Projection<'_>,
    deviation_multiplier: f64,
    [p0, p1]: [PixelPoint; 2],
    geometry: &mut DrawingGeometry,
) {
    let (t0, t1) = (drawing.points[0].time.get(), drawing.points[1].time.get());
    let (start, end) = (t0.min(t1).round() as i64, t0.max(t1).round() as i64);
    let fit = projection.bars.and_then(|bars| {
        // Only bars that exist can contribute samples.
        let last = i64::try_from(bars.bar_count()).ok()?.checked_sub(1)?;
        let (start, end) = (start.clamp(0, last), end.clamp(0, last));
        let samples = (start..=end)
            .filter_map(|index| bars.close(index).map(|close| (index as f64, close)))
            .collect::<Vec<_>>();
        linear_regression(&samples)
    });
    let Some(line) = fit else {
        // No bar data under the anchors: show the raw baseline.
        geometry.shapes.push(Shape::segment(p0, p1));
        return;
    };
    let band = line.std_dev * deviation_multiplier;
    let (x_start, x_end) = (projection.index_x(start as f64), projection.index_x(end as f64));
    for offset in [0.0, band, -band] {
        geometry.shapes.push(Shape::segment(
            PixelPoint::new(x_start, projection.price_y(line.value_at(start as f64) + offset)),
            PixelPoint::new(x_end, projection.price_y(line.value_at(end as f64) + offset)),
        ));
    }
    geometry.details = GeometryDetails::Regression(line);
}

/// Side table of pixel geometry keyed by drawing id.
///
/// Rebuilt from logical state on every render pass and before each pointer
/// hit-test; entries never outlive a scale change.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    entries: IndexMap<DrawingId, DrawingGeometry>,
}

impl GeometryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every entry with fresh geometry for the visible drawings.
    pub fn rebuild<'d>(
        &mut self,
        drawings: impl IntoIterator<Item = &'d Drawing>,
        projection: &Projection<'_>,
    ) {
        self.entries.clear();
        for drawing in drawings.into_iter().filter(|drawing| drawing.visible) {
            self.entries
                .insert(drawing.id, project_drawing(drawing, projection));
        }
        trace!(entries = self.entries.len(), "geometry cache rebuilt");
    }

    #[must_use]
    pub fn get(&self, id: DrawingId) -> Option<&DrawingGeometry> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DrawingId, &DrawingGeometry)> {
        self.entries.iter().map(|(id, geometry)| (*id, geometry))
    }

    pub fn remove(&mut self, id: DrawingId) {
        self.entries.shift_remove(&id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Pixel distance between two logical points under the current scales.
#[must_use]
pub fn pixel_distance(projection: &Projection<'_>, a: LogicalPoint, b: LogicalPoint) -> f64 {
    projection.to_pixel(a).distance_to(projection.to_pixel(b))
}
