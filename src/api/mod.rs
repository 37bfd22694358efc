//! Host-facing surface: configuration, input routing and render driving.

mod drawing_controller;
mod input_controller;
mod surface;
mod surface_config;

pub use surface::ChartSurface;
pub use surface_config::ChartSurfaceConfig;
