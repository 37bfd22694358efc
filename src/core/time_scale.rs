use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{BarIndex, Coordinate};
use crate::error::{ChartError, ChartResult};

/// User-facing tuning of the bar-index axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeScaleOptions {
    /// Bars of empty space kept to the right of the newest bar.
    pub right_offset: f64,
    pub bar_spacing: f64,
    pub min_bar_spacing: f64,
    pub max_bar_spacing: f64,
    /// Forbids scrolling the newest bar to the left of its home position.
    pub fix_left_edge: bool,
}

impl Default for TimeScaleOptions {
    fn default() -> Self {
        Self {
            right_offset: 5.0,
            bar_spacing: 6.0,
            min_bar_spacing: 0.5,
            max_bar_spacing: 50.0,
            fix_left_edge: false,
        }
    }
}

impl TimeScaleOptions {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.right_offset.is_finite() {
            return Err(ChartError::InvalidConfig(
                "time scale right offset must be finite".to_owned(),
            ));
        }
        if !self.min_bar_spacing.is_finite() || self.min_bar_spacing <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "min bar spacing must be finite and > 0".to_owned(),
            ));
        }
        if !self.max_bar_spacing.is_finite() || self.max_bar_spacing < self.min_bar_spacing {
            return Err(ChartError::InvalidConfig(
                "max bar spacing must be finite and >= min bar spacing".to_owned(),
            ));
        }
        if !self.bar_spacing.is_finite() || self.bar_spacing <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "bar spacing must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Whole-bar window clamped to the available data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub from: i64,
    pub to: i64,
}

impl VisibleRange {
    #[must_use]
    pub fn count(self) -> i64 {
        self.to - self.from + 1
    }

    #[must_use]
    pub fn contains(self, index: i64) -> bool {
        self.from <= index && index <= self.to
    }
}

/// Fractional, unclamped window in bar units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollSnapshot {
    start_x: f64,
    scroll_offset: f64,
}

/// Bar index ↔ pixel mapping with pan and zoom state.
///
/// Bars are laid out right to left from `base_index`: the newest bar sits
/// `right_offset` bars away from the right edge, shifted by `scroll_offset`
/// bars when the user pans into history.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScale {
    options: TimeScaleOptions,
    width: f64,
    bar_spacing: f64,
    right_offset: f64,
    scroll_offset: f64,
    points_count: usize,
    scroll_snapshot: Option<ScrollSnapshot>,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(TimeScaleOptions::default())
    }
}

impl TimeScale {
    #[must_use]
    pub fn new(options: TimeScaleOptions) -> Self {
        Self {
            width: 0.0,
            bar_spacing: options
                .bar_spacing
                .clamp(options.min_bar_spacing, options.max_bar_spacing.max(options.min_bar_spacing)),
            right_offset: options.right_offset,
            scroll_offset: 0.0,
            points_count: 0,
            scroll_snapshot: None,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> TimeScaleOptions {
        self.options
    }

    pub fn apply_options(&mut self, options: TimeScaleOptions) -> ChartResult<()> {
        self.options = options.validate()?;
        self.right_offset = self.options.right_offset;
        self.bar_spacing = self.options.bar_spacing;
        self.correct_bar_spacing();
        self.correct_offset();
        Ok(())
    }

    pub fn set_width(&mut self, width: f64) -> ChartResult<()> {
        if !width.is_finite() || width < 0.0 {
            return Err(ChartError::InvalidData(
                "time scale width must be finite and >= 0".to_owned(),
            ));
        }
        self.width = width;
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn bar_spacing(&self) -> f64 {
        self.bar_spacing
    }

    /// Sets bar spacing, clamped to the configured limits.
    pub fn set_bar_spacing(&mut self, bar_spacing: f64) -> ChartResult<()> {
        if !bar_spacing.is_finite() || bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale bar spacing must be finite and > 0".to_owned(),
            ));
        }
        self.bar_spacing = bar_spacing;
        self.correct_bar_spacing();
        Ok(())
    }

    #[must_use]
    pub fn right_offset(&self) -> f64 {
        self.right_offset
    }

    pub fn set_right_offset(&mut self, right_offset: f64) -> ChartResult<()> {
        if !right_offset.is_finite() {
            return Err(ChartError::InvalidData(
                "time scale right offset must be finite".to_owned(),
            ));
        }
        self.right_offset = right_offset;
        Ok(())
    }

    #[must_use]
    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    #[must_use]
    pub fn points_count(&self) -> usize {
        self.points_count
    }

    /// Index of the newest bar; `-1` when no data is loaded.
    #[must_use]
    pub fn base_index(&self) -> i64 {
        self.points_count as i64 - 1
    }

    /// Replaces the bar count. Callers must re-query `visible_range`.
    pub fn set_points_count(&mut self, points_count: usize) {
        self.points_count = points_count;
        self.correct_offset();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points_count == 0 || self.width <= 0.0
    }

    /// Projects a (possibly fractional, negative or future) bar index to x.
    #[must_use]
    pub fn index_to_coordinate(&self, index: impl Into<BarIndex>) -> Coordinate {
        let index = index.into().get();
        let delta_from_right = self.right_edge_index() - index + 0.5;
        Coordinate(self.width - delta_from_right * self.bar_spacing - 1.0)
    }

    /// Exact inverse of [`Self::index_to_coordinate`].
    #[must_use]
    pub fn coordinate_to_float_index(&self, x: impl Into<Coordinate>) -> BarIndex {
        let x = x.into().get();
        let delta_from_right = (self.width - 1.0 - x) / self.bar_spacing;
        BarIndex(self.right_edge_index() + 0.5 - delta_from_right)
    }

    /// Inverse projection rounded to the nearest whole bar.
    #[must_use]
    pub fn coordinate_to_index(&self, x: impl Into<Coordinate>) -> i64 {
        self.coordinate_to_float_index(x).get().round() as i64
    }

    /// Whole-bar window currently on screen, clamped to `[0, points_count - 1]`.
    #[must_use]
    pub fn visible_range(&self) -> Option<VisibleRange> {
        if self.is_empty() {
            return None;
        }
        let last = self.base_index();
        let to = self.right_edge_index().ceil();
        let from = (to - (self.width / self.bar_spacing).ceil()).floor();
        Some(VisibleRange {
            from: (from as i64).clamp(0, last),
            to: (to as i64).clamp(0, last),
        })
    }

    /// Fractional window currently on screen, without clamping to the data.
    #[must_use]
    pub fn visible_logical_range(&self) -> Option<LogicalRange> {
        if self.is_empty() {
            return None;
        }
        let to = self.right_edge_index();
        Some(LogicalRange {
            from: to - self.width / self.bar_spacing,
            to,
        })
    }

    /// Pans by a pixel delta; positive deltas move towards older bars.
    pub fn scroll_by(&mut self, delta_px: f64) {
        if !delta_px.is_finite() {
            return;
        }
        self.scroll_offset += delta_px / self.bar_spacing;
        self.correct_offset();
        trace!(
            delta_px,
            scroll_offset = self.scroll_offset,
            "time scale scroll"
        );
    }

    /// Zooms around `x`, keeping the bar under it visually fixed.
    ///
    /// Positive `scale` widens bars (zoom in). The spacing change must happen
    /// before the offset correction; the correction is measured at the same
    /// pixel with the new spacing.
    pub fn zoom(&mut self, x: impl Into<Coordinate>, scale: f64) {
        let x = x.into();
        if !x.get().is_finite() || !scale.is_finite() || scale == 0.0 {
            return;
        }
        let before = self.coordinate_to_float_index(x).get();
        self.bar_spacing += scale * self.bar_spacing / 10.0;
        self.correct_bar_spacing();
        let after = self.coordinate_to_float_index(x).get();
        self.scroll_offset += after - before;
        self.correct_offset();
        trace!(
            scale,
            bar_spacing = self.bar_spacing,
            scroll_offset = self.scroll_offset,
            "time scale zoom"
        );
    }

    /// Returns to the newest bar.
    pub fn scroll_to_realtime(&mut self) {
        self.scroll_offset = 0.0;
        self.correct_offset();
    }

    pub fn start_scroll(&mut self, x: f64) {
        if self.scroll_snapshot.is_some() || !x.is_finite() {
            return;
        }
        self.scroll_snapshot = Some(ScrollSnapshot {
            start_x: x,
            scroll_offset: self.scroll_offset,
        });
    }

    pub fn scroll_to(&mut self, x: f64) {
        let Some(snapshot) = self.scroll_snapshot else {
            return;
        };
        if !x.is_finite() {
            return;
        }
        self.scroll_offset = snapshot.scroll_offset + (x - snapshot.start_x) / self.bar_spacing;
        self.correct_offset();
    }

    pub fn end_scroll(&mut self) {
        self.scroll_snapshot = None;
    }

    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.scroll_snapshot.is_some()
    }

    fn right_edge_index(&self) -> f64 {
        self.base_index() as f64 + self.right_offset - self.scroll_offset
    }

    fn correct_bar_spacing(&mut self) {
        let min = self.options.min_bar_spacing;
        let max = self.options.max_bar_spacing.max(min);
        self.bar_spacing = self.bar_spacing.clamp(min, max);
    }

    fn correct_offset(&mut self) {
        if self.points_count == 0 {
            self.scroll_offset = 0.0;
            return;
        }
        let last = (self.points_count - 1) as f64;
        let min = if self.options.fix_left_edge { 0.0 } else { -last };
        self.scroll_offset = self.scroll_offset.clamp(min, last);
    }
}
