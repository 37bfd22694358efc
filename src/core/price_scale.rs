use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{Coordinate, Price, VisibleRange};
use crate::error::{ChartError, ChartResult};

/// Smallest half-range a rescale drag may collapse to.
const MIN_HALF_RANGE: f64 = 1e-10;

/// Target pixel distance between two neighbouring price marks.
const MARK_SPACING_PX: f64 = 30.0;

/// Fractional padding reserved above and below the price range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleMargins {
    pub top: f64,
    pub bottom: f64,
}

impl Default for ScaleMargins {
    fn default() -> Self {
        Self {
            top: 0.2,
            bottom: 0.1,
        }
    }
}

impl ScaleMargins {
    pub fn validate(self) -> ChartResult<Self> {
        if !(0.0..=1.0).contains(&self.top) {
            return Err(ChartError::InvalidConfig(
                "price scale top margin must be in [0,1]".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&self.bottom) {
            return Err(ChartError::InvalidConfig(
                "price scale bottom margin must be in [0,1]".to_owned(),
            ));
        }
        if self.top + self.bottom >= 1.0 {
            return Err(ChartError::InvalidConfig(
                "sum of price scale margins must be < 1".to_owned(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceScaleOptions {
    pub auto_scale: bool,
    pub invert_scale: bool,
    pub scale_margins: ScaleMargins,
    /// Exponent per dragged pixel used by the rescale gesture.
    pub scale_sensitivity: f64,
    /// Smallest meaningful price step; a flat auto-scaled range is widened by
    /// five of them on each side.
    pub min_move: f64,
}

impl Default for PriceScaleOptions {
    fn default() -> Self {
        Self {
            auto_scale: true,
            invert_scale: false,
            scale_margins: ScaleMargins::default(),
            scale_sensitivity: 0.005,
            min_move: 0.01,
        }
    }
}

impl PriceScaleOptions {
    pub fn validate(self) -> ChartResult<Self> {
        self.scale_margins.validate()?;
        if !self.scale_sensitivity.is_finite() || self.scale_sensitivity <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "price scale sensitivity must be finite and > 0".to_owned(),
            ));
        }
        if !self.min_move.is_finite() || self.min_move <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "price scale min move must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(self) -> f64 {
        (self.max + self.min) * 0.5
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        let length = self.length();
        !length.is_finite() || length <= 0.0
    }

    #[must_use]
    pub fn merge(self, other: PriceRange) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn shifted(self, delta: f64) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}

/// One tick on the price axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceMark {
    pub price: f64,
    pub coordinate: f64,
}

/// Data boundary consumed by auto-scale.
pub trait PriceRangeSource {
    /// Price extent of bars `from..=to`, or `None` when the span holds no data.
    fn price_range(&self, from: i64, to: i64) -> Option<PriceRange>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSnapshot {
    start_y: f64,
    range: PriceRange,
}

/// Price ↔ pixel mapping for the vertical axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceScale {
    options: PriceScaleOptions,
    height: f64,
    price_range: Option<PriceRange>,
    scale_snapshot: Option<DragSnapshot>,
    scroll_snapshot: Option<DragSnapshot>,
}

impl Default for PriceScale {
    fn default() -> Self {
        Self::new(PriceScaleOptions::default())
    }
}

impl PriceScale {
    #[must_use]
    pub fn new(options: PriceScaleOptions) -> Self {
        Self {
            options,
            height: 0.0,
            price_range: None,
            scale_snapshot: None,
            scroll_snapshot: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> PriceScaleOptions {
        self.options
    }

    pub fn apply_options(&mut self, options: PriceScaleOptions) -> ChartResult<()> {
        self.options = options.validate()?;
        Ok(())
    }

    pub fn set_height(&mut self, height: f64) -> ChartResult<()> {
        if !height.is_finite() || height < 0.0 {
            return Err(ChartError::InvalidData(
                "price scale height must be finite and >= 0".to_owned(),
            ));
        }
        self.height = height;
        Ok(())
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_scale_margins(&mut self, margins: ScaleMargins) -> ChartResult<()> {
        self.options.scale_margins = margins.validate()?;
        Ok(())
    }

    #[must_use]
    pub fn scale_margins(&self) -> ScaleMargins {
        self.options.scale_margins
    }

    #[must_use]
    pub fn is_auto_scale(&self) -> bool {
        self.options.auto_scale
    }

    pub fn set_auto_scale(&mut self, auto_scale: bool) {
        self.options.auto_scale = auto_scale;
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.options.invert_scale
    }

    pub fn set_invert_scale(&mut self, inverted: bool) {
        self.options.invert_scale = inverted;
    }

    #[must_use]
    pub fn price_range(&self) -> Option<PriceRange> {
        self.price_range
    }

    pub fn set_price_range(&mut self, range: Option<PriceRange>) {
        self.price_range = range;
    }

    /// Pixel budget between the two margins.
    #[must_use]
    pub fn internal_height(&self) -> f64 {
        self.height - self.top_margin_px() - self.bottom_margin_px()
    }

    /// Price units covered by one pixel, or `None` for a degenerate scale.
    #[must_use]
    pub fn price_per_pixel(&self) -> Option<f64> {
        let range = self.usable_range()?;
        let internal = self.internal_height();
        (internal > 0.0).then(|| range.length() / internal)
    }

    #[must_use]
    pub fn price_to_coordinate(&self, price: impl Into<Price>) -> Coordinate {
        let price = price.into().get();
        let top = self.top_margin_px();
        let Some(range) = self.usable_range() else {
            return Coordinate(top);
        };
        let ratio = (price - range.min()) / range.length();
        let offset = if self.is_inverted() { ratio } else { 1.0 - ratio };
        Coordinate(top + offset * self.internal_height())
    }

    #[must_use]
    pub fn coordinate_to_price(&self, y: impl Into<Coordinate>) -> Price {
        let y = y.into().get();
        let Some(range) = self.usable_range() else {
            return Price(self.price_range.map_or(0.0, PriceRange::min));
        };
        let internal = self.internal_height();
        if internal <= 0.0 {
            return Price(range.min());
        }
        let ratio = (y - self.top_margin_px()) / internal;
        if self.is_inverted() {
            Price(range.min() + ratio * range.length())
        } else {
            Price(range.max() - ratio * range.length())
        }
    }

    /// Recomputes the range from visible data when auto-scale is on.
    ///
    /// Returns `true` when the range changed.
    pub fn autoscale(
        &mut self,
        source: &dyn PriceRangeSource,
        visible: Option<VisibleRange>,
    ) -> bool {
        if !self.options.auto_scale {
            return false;
        }
        let Some(visible) = visible else {
            return false;
        };
        let Some(mut range) = source.price_range(visible.from, visible.to) else {
            return false;
        };
        if !range.min().is_finite() || !range.max().is_finite() {
            return false;
        }
        if range.length() <= f64::EPSILON {
            let extend = 5.0 * self.options.min_move;
            range = PriceRange::new(range.min() - extend, range.max() + extend);
        }
        let changed = self.price_range != Some(range);
        self.price_range = Some(range);
        if changed {
            trace!(min = range.min(), max = range.max(), "price scale autoscaled");
        }
        changed
    }

    /// Begins a drag-to-rescale gesture at `y`.
    pub fn start_scale(&mut self, y: f64) {
        if self.scale_snapshot.is_some() || !y.is_finite() {
            return;
        }
        let Some(range) = self.usable_range() else {
            return;
        };
        self.options.auto_scale = false;
        self.scale_snapshot = Some(DragSnapshot { start_y: y, range });
    }

    /// Rescales exponentially around the snapshot midpoint.
    pub fn scale_to(&mut self, y: f64) {
        let Some(snapshot) = self.scale_snapshot else {
            return;
        };
        if !y.is_finite() {
            return;
        }
        let factor = ((y - snapshot.start_y) * self.options.scale_sensitivity).exp();
        let center = snapshot.range.center();
        let half = (snapshot.range.length() * 0.5 * factor).max(MIN_HALF_RANGE);
        self.price_range = Some(PriceRange::new(center - half, center + half));
    }

    pub fn end_scale(&mut self) {
        self.scale_snapshot = None;
    }

    #[must_use]
    pub fn is_scaling(&self) -> bool {
        self.scale_snapshot.is_some()
    }

    /// Begins a drag-to-scroll gesture at `y`.
    pub fn start_scroll(&mut self, y: f64) {
        if self.scroll_snapshot.is_some() || !y.is_finite() {
            return;
        }
        let Some(range) = self.usable_range() else {
            return;
        };
        self.options.auto_scale = false;
        self.scroll_snapshot = Some(DragSnapshot { start_y: y, range });
    }

    pub fn scroll_to(&mut self, y: f64) {
        let Some(snapshot) = self.scroll_snapshot else {
            return;
        };
        let internal = self.internal_height();
        if !y.is_finite() || internal <= 0.0 {
            return;
        }
        let price_per_pixel = snapshot.range.length() / internal;
        let mut delta = (y - snapshot.start_y) * price_per_pixel;
        if self.is_inverted() {
            delta = -delta;
        }
        self.price_range = Some(snapshot.range.shifted(delta));
    }

    pub fn end_scroll(&mut self) {
        self.scroll_snapshot = None;
    }

    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.scroll_snapshot.is_some()
    }

    /// Round tick values covering the whole pane height.
    #[must_use]
    pub fn marks(&self) -> Vec<PriceMark> {
        if self.height <= 0.0 || self.usable_range().is_none() {
            return Vec::new();
        }
        let edge_a = self.coordinate_to_price(0.0).get();
        let edge_b = self.coordinate_to_price(self.height).get();
        let (low, high) = (edge_a.min(edge_b), edge_a.max(edge_b));
        let target_count = (self.height / MARK_SPACING_PX).max(1.0);
        let Some(step) = nice_step((high - low) / target_count) else {
            return Vec::new();
        };

        let first = (low / step).ceil() as i64;
        let last = (high / step).floor() as i64;
        (first..=last)
            .map(|k| k as f64 * step)
            .filter_map(|price| {
                let coordinate = self.price_to_coordinate(price).get();
                (0.0..=self.height)
                    .contains(&coordinate)
                    .then_some(PriceMark { price, coordinate })
            })
            .collect()
    }

    fn usable_range(&self) -> Option<PriceRange> {
        self.price_range.filter(|range| !range.is_empty())
    }

    fn top_margin_px(&self) -> f64 {
        self.options.scale_margins.top * self.height
    }

    fn bottom_margin_px(&self) -> f64 {
        self.options.scale_margins.bottom * self.height
    }
}

/// Smallest step of the form `{1, 2, 5} × 10^n` that is `>= raw`.
fn nice_step(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    Some(nice * magnitude)
}

#[cfg(test)]
mod tests {
    use super::{PriceRange, PriceScale, PriceScaleOptions, ScaleMargins, nice_step};

    fn scale(min: f64, max: f64) -> PriceScale {
        let mut price_scale = PriceScale::new(PriceScaleOptions {
            scale_margins: ScaleMargins {
                top: 0.0,
                bottom: 0.0,
            },
            ..PriceScaleOptions::default()
        });
        price_scale.set_height(500.0).expect("height");
        price_scale.set_price_range(Some(PriceRange::new(min, max)));
        price_scale
    }

    #[test]
    fn linear_round_trip_is_stable() {
        let price_scale = scale(100.0, 200.0);
        let y = price_scale.price_to_coordinate(150.0);
        assert!((y.get() - 250.0).abs() <= 1e-9);
        let p = price_scale.coordinate_to_price(y);
        assert!((p.get() - 150.0).abs() <= 1e-9);
    }

    #[test]
    fn degenerate_range_maps_to_top_margin_and_min() {
        let mut price_scale = scale(100.0, 100.0);
        price_scale
            .set_scale_margins(ScaleMargins {
                top: 0.1,
                bottom: 0.1,
            })
            .expect("margins");
        assert!((price_scale.price_to_coordinate(123.0).get() - 50.0).abs() <= 1e-9);
        assert!((price_scale.coordinate_to_price(321.0).get() - 100.0).abs() <= 1e-9);
    }

    #[test]
    fn nice_steps_follow_one_two_five() {
        assert!((nice_step(0.7).expect("step") - 1.0).abs() <= 1e-12);
        assert!((nice_step(1.3).expect("step") - 2.0).abs() <= 1e-12);
        assert!((nice_step(33.0).expect("step") - 50.0).abs() <= 1e-9);
        assert!((nice_step(70.0).expect("step") - 100.0).abs() <= 1e-9);
        assert_eq!(nice_step(0.0), None);
    }

    #[test]
    fn inverted_scale_flips_pixel_axis() {
        let mut price_scale = scale(0.0, 100.0);
        price_scale.set_invert_scale(true);
        assert!((price_scale.price_to_coordinate(0.0).get() - 0.0).abs() <= 1e-9);
        assert!((price_scale.price_to_coordinate(100.0).get() - 500.0).abs() <= 1e-9);
    }
}
