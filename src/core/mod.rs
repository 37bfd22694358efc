//! Coordinate engine: tagged axis types and the two scales.

pub mod bars;
pub mod price_scale;
pub mod primitives;
pub mod time_scale;
pub mod types;

pub use bars::{BarSeries, BarSource, OhlcBar};
pub use price_scale::{
    PriceMark, PriceRange, PriceRangeSource, PriceScale, PriceScaleOptions, ScaleMargins,
};
pub use primitives::{BarIndex, Coordinate, LogicalPoint, Price};
pub use time_scale::{LogicalRange, TimeScale, TimeScaleOptions, VisibleRange};
pub use types::{DeviceTransform, PixelPoint, Viewport};
