use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Price, PriceRange, PriceRangeSource};
use crate::error::{ChartError, ChartResult};

/// One OHLC bar. Its bar index is its position in the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcBar {
    /// Builds a validated bar.
    ///
    /// Invariants:
    /// - all values are finite
    /// - `low <= high`
    /// - `open` and `close` are within `[low, high]`
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> ChartResult<Self> {
        if !open.is_finite() || !high.is_finite() || !low.is_finite() || !close.is_finite() {
            return Err(ChartError::InvalidData(
                "ohlc values must be finite".to_owned(),
            ));
        }
        if low > high {
            return Err(ChartError::InvalidData(
                "ohlc low must be <= high".to_owned(),
            ));
        }
        if open < low || open > high || close < low || close > high {
            return Err(ChartError::InvalidData(
                "ohlc open/close must be within low/high range".to_owned(),
            ));
        }
        Ok(Self {
            open,
            high,
            low,
            close,
        })
    }

    pub fn from_decimal(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> ChartResult<Self> {
        Self::new(
            Price::from_decimal(open)?.get(),
            Price::from_decimal(high)?.get(),
            Price::from_decimal(low)?.get(),
            Price::from_decimal(close)?.get(),
        )
    }
}

/// Data boundary for the drawing layer: bar count plus closing prices.
///
/// Regression channels read closes; auto-scale reads price extents through
/// the [`PriceRangeSource`] supertrait.
pub trait BarSource: PriceRangeSource {
    fn bar_count(&self) -> usize;
    fn close(&self, index: i64) -> Option<f64>;
}

/// In-memory bar series, the default [`BarSource`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    bars: Vec<OhlcBar>,
}

impl BarSeries {
    #[must_use]
    pub fn new(bars: Vec<OhlcBar>) -> Self {
        Self { bars }
    }

    /// Builds flat bars (`open == high == low == close`) from closing prices.
    pub fn from_closes(closes: &[f64]) -> ChartResult<Self> {
        closes
            .iter()
            .map(|&close| OhlcBar::new(close, close, close, close))
            .collect::<ChartResult<Vec<_>>>()
            .map(Self::new)
    }

    pub fn push(&mut self, bar: OhlcBar) {
        self.bars.push(bar);
    }

    #[must_use]
    pub fn bars(&self) -> &[OhlcBar] {
        &self.bars
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    fn get(&self, index: i64) -> Option<&OhlcBar> {
        usize::try_from(index).ok().and_then(|i| self.bars.get(i))
    }
}

impl PriceRangeSource for BarSeries {
    fn price_range(&self, from: i64, to: i64) -> Option<PriceRange> {
        let (from, to) = (from.min(to).max(0), from.max(to));
        (from..=to)
            .filter_map(|index| self.get(index))
            .map(|bar| PriceRange::new(bar.low, bar.high))
            .reduce(PriceRange::merge)
    }
}

impl BarSource for BarSeries {
    fn bar_count(&self) -> usize {
        self.bars.len()
    }

    fn close(&self, index: i64) -> Option<f64> {
        self.get(index).map(|bar| bar.close)
    }
}

#[cfg(test)]
mod tests {
    use super::{BarSeries, BarSource, OhlcBar};
    use crate::core::PriceRangeSource;

    #[test]
    fn rejects_open_outside_low_high() {
        assert!(OhlcBar::new(12.0, 11.0, 9.0, 10.0).is_err());
    }

    #[test]
    fn price_range_spans_requested_bars_only() {
        let series = BarSeries::new(vec![
            OhlcBar::new(10.0, 12.0, 9.0, 11.0).expect("bar"),
            OhlcBar::new(11.0, 20.0, 10.0, 19.0).expect("bar"),
            OhlcBar::new(19.0, 19.5, 1.0, 2.0).expect("bar"),
        ]);
        let range = series.price_range(0, 1).expect("range");
        assert!((range.min() - 9.0).abs() <= 1e-12);
        assert!((range.max() - 20.0).abs() <= 1e-12);
        assert!(series.price_range(5, 9).is_none());
        assert_eq!(series.close(2), Some(2.0));
        assert_eq!(series.close(-1), None);
    }
}
