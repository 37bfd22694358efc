use crate::core::{DeviceTransform, PixelPoint, Viewport};
use crate::drawing::projection::ELLIPSE_SEGMENTS;
use crate::drawing::{Drawing, DrawingGeometry, GeometryCache, Shape};
use crate::error::{ChartError, ChartResult};
use crate::render::{Color, FillPrimitive, HandlePrimitive, LinePrimitive};

pub const HANDLE_HALF_SIZE_PX: f64 = 4.0;

/// Inputs of one drawing render pass.
///
/// `time_to_pixel` and `price_to_pixel` wrap the scales for backends that
/// place their own decorations; the geometry cache already holds projected
/// shapes in CSS pixels.
pub struct DrawingPass<'a> {
    pub drawings: &'a [&'a Drawing],
    pub geometry: &'a GeometryCache,
    pub time_to_pixel: &'a dyn Fn(f64) -> f64,
    pub price_to_pixel: &'a dyn Fn(f64) -> f64,
    pub viewport: Viewport,
    pub device: DeviceTransform,
}

impl DrawingPass<'_> {
    /// Converts the cached geometry into device-space primitives.
    #[must_use]
    pub fn build_frame(&self) -> DrawingFrame {
        let mut frame = DrawingFrame::new(self.viewport, self.device);
        for drawing in self.drawings.iter().filter(|drawing| drawing.visible) {
            if let Some(geometry) = self.geometry.get(drawing.id) {
                frame.push_drawing(drawing, geometry);
            }
        }
        frame
    }
}

/// Backend-agnostic device-space scene for the drawing layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingFrame {
    pub viewport: Viewport,
    pub device: DeviceTransform,
    pub lines: Vec<LinePrimitive>,
    pub fills: Vec<FillPrimitive>,
    pub handles: Vec<HandlePrimitive>,
}

impl DrawingFrame {
    #[must_use]
    pub fn new(viewport: Viewport, device: DeviceTransform) -> Self {
        Self {
            viewport,
            device,
            lines: Vec::new(),
            fills: Vec::new(),
            handles: Vec::new(),
        }
    }

    fn push_drawing(&mut self, drawing: &Drawing, geometry: &DrawingGeometry) {
        let style = drawing.style;
        let device = self.device;
        let stroke_width = device.scale_length(style.line_width);
        let dash = style.dash.pattern();
        let fill_color = style
            .fill_color
            .map(|color| color.with_alpha(color.alpha * style.fill_opacity));

        for shape in &geometry.shapes {
            let (outline, closed, filled): (Vec<PixelPoint>, bool, bool) = match shape {
                Shape::Segment { from, to } => (vec![*from, *to], false, false),
                Shape::Polyline(points) => (points.clone(), false, false),
                Shape::Polygon { points, filled } => (points.clone(), true, *filled),
                Shape::Ellipse { ellipse, filled } => {
                    (ellipse.outline(ELLIPSE_SEGMENTS), true, *filled)
                }
                Shape::Icon { center, half_size } => {
                    let h = *half_size;
                    (
                        vec![
                            PixelPoint::new(center.x - h, center.y - h),
                            PixelPoint::new(center.x + h, center.y - h),
                            PixelPoint::new(center.x + h, center.y + h),
                            PixelPoint::new(center.x - h, center.y + h),
                        ],
                        true,
                        false,
                    )
                }
            };
            let outline: Vec<PixelPoint> = outline
                .into_iter()
                .map(|point| device.to_device(point))
                .collect();
            if filled && outline.len() >= 3 {
                // Arrow heads and icons fill with the stroke color.
                self.fills.push(FillPrimitive {
                    outline: outline.clone(),
                    color: fill_color.unwrap_or(style.color),
                });
            }
            let mut edges: Vec<(PixelPoint, PixelPoint)> =
                outline.windows(2).map(|pair| (pair[0], pair[1])).collect();
            if closed && outline.len() > 2 {
                edges.push((outline[outline.len() - 1], outline[0]));
            }
            self.lines.extend(edges.into_iter().map(|(from, to)| LinePrimitive {
                from,
                to,
                stroke_width,
                color: style.color,
                dash,
            }));
        }

        if drawing.is_selected() {
            let half_size = device.scale_length(HANDLE_HALF_SIZE_PX);
            self.handles
                .extend(geometry.control_points.iter().map(|point| HandlePrimitive {
                    center: device.to_device(*point),
                    half_size,
                    color: Color::rgb(1.0, 1.0, 1.0),
                }));
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        for line in &self.lines {
            line.validate()?;
        }
        for fill in &self.fills {
            fill.validate()?;
        }
        for handle in &self.handles {
            handle.validate()?;
        }
        Ok(())
    }
}
