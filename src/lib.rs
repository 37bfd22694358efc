//! chart-draw: coordinate engine and interactive drawing tools for
//! financial charts.
//!
//! Drawings are anchored in logical (bar index × price) space and re-projected
//! through [`core::TimeScale`] and [`core::PriceScale`] on every render pass;
//! pointer input is inverse-projected before it reaches the drawing state
//! machine.

pub mod api;
pub mod core;
pub mod drawing;
pub mod error;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{ChartSurface, ChartSurfaceConfig};
pub use error::{ChartError, ChartResult};
