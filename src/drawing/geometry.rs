//! Pure pixel-space geometry used by projection and hit-testing.
//!
//! Every solver is total: degenerate input (coincident points, empty spans)
//! yields `None` or a collapsed result instead of NaN.

use serde::{Deserialize, Serialize};

use crate::core::PixelPoint;

/// Distance from `p` to the closed segment `a..b`.
///
/// The projection parameter is clamped to `[0, 1]`; a zero-length segment
/// degrades to point distance.
#[must_use]
pub fn distance_to_segment(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let ab = b - a;
    let length_sq = ab.dot(ab);
    if length_sq <= f64::EPSILON {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    p.distance_to(a + ab * t)
}

/// Smallest distance from `p` to any segment of an open polyline.
#[must_use]
pub fn distance_to_polyline(p: PixelPoint, points: &[PixelPoint]) -> Option<f64> {
    match points {
        [] => None,
        [single] => Some(p.distance_to(*single)),
        _ => points
            .windows(2)
            .map(|pair| distance_to_segment(p, pair[0], pair[1]))
            .reduce(f64::min),
    }
}

/// Smallest distance from `p` to the outline of a closed polygon.
#[must_use]
pub fn distance_to_polygon_outline(p: PixelPoint, points: &[PixelPoint]) -> Option<f64> {
    let open = distance_to_polyline(p, points)?;
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 2 => {
            Some(open.min(distance_to_segment(p, *last, *first)))
        }
        _ => Some(open),
    }
}

/// Even-odd point-in-polygon test.
#[must_use]
pub fn polygon_contains(points: &[PixelPoint], p: PixelPoint) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Extends the line through `a` and `b` to the rectangle `[0, width] × [0, height]`.
///
/// `extend_start` continues past `a`, `extend_end` past `b`. Returns the
/// visible part of the (possibly infinite) line, or `None` when it misses the
/// viewport or `a == b`.
#[must_use]
pub fn clip_line_to_viewport(
    a: PixelPoint,
    b: PixelPoint,
    extend_start: bool,
    extend_end: bool,
    width: f64,
    height: f64,
) -> Option<(PixelPoint, PixelPoint)> {
    let d = b - a;
    if d.dot(d) <= f64::EPSILON {
        return None;
    }
    let mut t0 = if extend_start { f64::NEG_INFINITY } else { 0.0 };
    let mut t1 = if extend_end { f64::INFINITY } else { 1.0 };

    // Liang-Barsky against the four viewport edges.
    for (p, q) in [
        (-d.x, a.x),
        (d.x, width - a.x),
        (-d.y, a.y),
        (d.y, height - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    if !t0.is_finite() || !t1.is_finite() {
        return None;
    }
    Some((a + d * t0, a + d * t1))
}

/// Vector from the line `a..b` to `p`, perpendicular to the line.
///
/// Falls back to `p - a` when `a == b`.
#[must_use]
pub fn perpendicular_offset(a: PixelPoint, b: PixelPoint, p: PixelPoint) -> PixelPoint {
    let d = b - a;
    let length = d.length();
    if length <= f64::EPSILON {
        return p - a;
    }
    let normal = PixelPoint::new(-d.y / length, d.x / length);
    normal * (p - a).dot(normal)
}

/// Corners of a rotated rectangle, in outline order.
///
/// With two points the box is axis-aligned with `p0`/`p1` as opposite
/// corners (creation preview). With a third point, `p0..p1` is one side and
/// the perpendicular offset of `p2` is the other.
#[must_use]
pub fn rotated_rectangle_corners(
    p0: PixelPoint,
    p1: PixelPoint,
    p2: Option<PixelPoint>,
) -> [PixelPoint; 4] {
    match p2 {
        None => [
            p0,
            PixelPoint::new(p1.x, p0.y),
            p1,
            PixelPoint::new(p0.x, p1.y),
        ],
        Some(p2) => {
            let offset = perpendicular_offset(p0, p1, p2);
            [p0, p1, p1 + offset, p0 + offset]
        }
    }
}

/// Ellipse in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseParams {
    pub center: PixelPoint,
    pub radius_x: f64,
    pub radius_y: f64,
    /// Rotation of the `radius_x` axis in radians.
    pub rotation: f64,
}

impl EllipseParams {
    /// Point on the outline at parametric angle `theta`.
    #[must_use]
    pub fn point_at(&self, theta: f64) -> PixelPoint {
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let u = self.radius_x * theta.cos();
        let v = self.radius_y * theta.sin();
        PixelPoint::new(
            self.center.x + u * cos_r - v * sin_r,
            self.center.y + u * sin_r + v * cos_r,
        )
    }

    /// Closed outline sampled with `segments` vertices.
    #[must_use]
    pub fn outline(&self, segments: usize) -> Vec<PixelPoint> {
        let segments = segments.max(4);
        (0..segments)
            .map(|i| self.point_at(std::f64::consts::TAU * i as f64 / segments as f64))
            .collect()
    }

    /// Value of the normalised implicit equation; `1.0` on the outline.
    #[must_use]
    pub fn implicit(&self, p: PixelPoint) -> Option<f64> {
        if self.radius_x <= f64::EPSILON || self.radius_y <= f64::EPSILON {
            return None;
        }
        let (u, v) = self.to_local(p);
        Some((u / self.radius_x).powi(2) + (v / self.radius_y).powi(2))
    }

    fn to_local(&self, p: PixelPoint) -> (f64, f64) {
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let d = p - self.center;
        (d.x * cos_r + d.y * sin_r, -d.x * sin_r + d.y * cos_r)
    }
}

/// Ellipse whose major chord is `p0..p1` and which passes through `p2`.
///
/// Without `p2` the result is the circle on the chord. When `p2` lies on or
/// beyond the chord's extent the minor radius falls back to `p2`'s distance
/// from the chord.
#[must_use]
pub fn ellipse_through_points(
    p0: PixelPoint,
    p1: PixelPoint,
    p2: Option<PixelPoint>,
) -> Option<EllipseParams> {
    let chord = p1 - p0;
    let radius_x = chord.length() * 0.5;
    if radius_x <= f64::EPSILON {
        return None;
    }
    let mut ellipse = EllipseParams {
        center: p0.midpoint(p1),
        radius_x,
        radius_y: radius_x,
        rotation: chord.y.atan2(chord.x),
    };
    if let Some(p2) = p2 {
        let (u, v) = ellipse.to_local(p2);
        let ratio = (u / radius_x).powi(2);
        ellipse.radius_y = if ratio < 1.0 {
            v.abs() / (1.0 - ratio).sqrt()
        } else {
            v.abs()
        };
    }
    Some(ellipse)
}

/// Control point of the quadratic curve through `p0`, `p2` (at `t = 0.5`)
/// and `p1`.
#[must_use]
pub fn arc_control_point(p0: PixelPoint, p1: PixelPoint, p2: PixelPoint) -> PixelPoint {
    p2 * 2.0 - p0 * 0.5 - p1 * 0.5
}

/// Quadratic Bézier from `p0` to `p1` passing through `p2`, sampled.
#[must_use]
pub fn arc_through_points(
    p0: PixelPoint,
    p1: PixelPoint,
    p2: PixelPoint,
    segments: usize,
) -> Vec<PixelPoint> {
    let control = arc_control_point(p0, p1, p2);
    let segments = segments.max(2);
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let mt = 1.0 - t;
            p0 * (mt * mt) + control * (2.0 * mt * t) + p1 * (t * t)
        })
        .collect()
}

/// Ordinary least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionLine {
    pub slope: f64,
    pub intercept: f64,
    /// Population standard deviation of the residuals.
    pub std_dev: f64,
}

impl RegressionLine {
    #[must_use]
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fits a regression line; a single sample gives a flat line.
#[must_use]
pub fn linear_regression(samples: &[(f64, f64)]) -> Option<RegressionLine> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut sxx, mut sxy) = (0.0, 0.0);
    for (x, y) in samples {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    let slope = if sxx > f64::EPSILON { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;
    let variance = samples
        .iter()
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum::<f64>()
        / n;
    Some(RegressionLine {
        slope,
        intercept,
        std_dev: variance.sqrt(),
    })
}

/// Screen-space angle of `a -> b` in degrees, counter-clockwise, y up.
#[must_use]
pub fn angle_degrees(a: PixelPoint, b: PixelPoint) -> f64 {
    (a.y - b.y).atan2(b.x - a.x).to_degrees()
}

/// Two barbs of an arrow head at `tip`, pointing back along `from -> tip`.
#[must_use]
pub fn arrow_head(from: PixelPoint, tip: PixelPoint, length: f64) -> Option<[PixelPoint; 2]> {
    let d = tip - from;
    let norm = d.length();
    if norm <= f64::EPSILON {
        return None;
    }
    let back = d * (-length / norm);
    let (sin, cos) = std::f64::consts::FRAC_PI_6.sin_cos();
    let rotate = |v: PixelPoint, s: f64| PixelPoint::new(v.x * cos - v.y * s, v.x * s + v.y * cos);
    Some([tip + rotate(back, sin), tip + rotate(back, -sin)])
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn p(x: f64, y: f64) -> PixelPoint {
        PixelPoint::new(x, y)
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        assert_abs_diff_eq!(distance_to_segment(p(5.0, 3.0), p(0.0, 0.0), p(10.0, 0.0)), 3.0);
        assert_abs_diff_eq!(distance_to_segment(p(13.0, 4.0), p(0.0, 0.0), p(10.0, 0.0)), 5.0);
        assert_abs_diff_eq!(distance_to_segment(p(3.0, 4.0), p(0.0, 0.0), p(0.0, 0.0)), 5.0);
    }

    #[test]
    fn ellipse_passes_through_third_anchor() {
        let ellipse =
            ellipse_through_points(p(0.0, 0.0), p(10.0, 0.0), Some(p(5.0, 5.0))).expect("ellipse");
        assert_abs_diff_eq!(ellipse.center.x, 5.0);
        assert_abs_diff_eq!(ellipse.radius_x, 5.0);
        assert_abs_diff_eq!(ellipse.radius_y, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ellipse.implicit(p(5.0, 5.0)).expect("value"), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn off_centre_third_point_still_on_outline() {
        let through = p(8.0, 3.0);
        let ellipse =
            ellipse_through_points(p(0.0, 0.0), p(10.0, 0.0), Some(through)).expect("ellipse");
        assert_abs_diff_eq!(ellipse.implicit(through).expect("value"), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn coincident_chord_has_no_ellipse() {
        assert!(ellipse_through_points(p(1.0, 1.0), p(1.0, 1.0), None).is_none());
    }

    #[test]
    fn arc_midpoint_is_third_anchor() {
        let points = arc_through_points(p(0.0, 0.0), p(10.0, 0.0), p(5.0, -4.0), 2);
        assert_abs_diff_eq!(points[1].x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(points[1].y, -4.0, epsilon = 1e-12);
        let control = arc_control_point(p(0.0, 0.0), p(10.0, 0.0), p(5.0, -4.0));
        assert_abs_diff_eq!(control.y, -8.0, epsilon = 1e-12);
    }

    #[test]
    fn regression_recovers_exact_line() {
        let samples: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 3.0 * i as f64 + 1.0)).collect();
        let line = linear_regression(&samples).expect("fit");
        assert_abs_diff_eq!(line.slope, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(line.intercept, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(line.std_dev, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn ray_is_clipped_to_viewport() {
        let (start, end) = clip_line_to_viewport(p(10.0, 10.0), p(20.0, 10.0), false, true, 100.0, 50.0)
            .expect("visible");
        assert_abs_diff_eq!(start.x, 10.0);
        assert_abs_diff_eq!(end.x, 100.0);

        let (start, _) = clip_line_to_viewport(p(10.0, 10.0), p(20.0, 10.0), true, true, 100.0, 50.0)
            .expect("visible");
        assert_abs_diff_eq!(start.x, 0.0);

        assert!(clip_line_to_viewport(p(10.0, 80.0), p(20.0, 80.0), true, true, 100.0, 50.0).is_none());
    }

    #[test]
    fn rotated_rectangle_uses_perpendicular_offset() {
        let corners = rotated_rectangle_corners(p(0.0, 0.0), p(10.0, 0.0), Some(p(3.0, 4.0)));
        assert_abs_diff_eq!(corners[2].x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corners[2].y, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corners[3].x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn polygon_contains_interior_only() {
        let square = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        assert!(polygon_contains(&square, p(5.0, 5.0)));
        assert!(!polygon_contains(&square, p(15.0, 5.0)));
    }

    #[test]
    fn angle_is_measured_with_y_up() {
        assert_abs_diff_eq!(angle_degrees(p(0.0, 0.0), p(10.0, -10.0)), 45.0, epsilon = 1e-9);
    }
}
