use serde::{Deserialize, Serialize};

use crate::core::{PriceScaleOptions, TimeScaleOptions, Viewport};
use crate::drawing::{DrawingManagerOptions, HitTestConfig};
use crate::error::{ChartError, ChartResult};
use crate::interaction::InteractionConfig;

fn default_price_axis_width() -> f64 {
    60.0
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

/// Public surface bootstrap configuration.
///
/// Serializable so hosts can persist chart setup next to their drawings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartSurfaceConfig {
    pub viewport: Viewport,
    /// Width of the price-axis strip on the right edge; the plot area is the
    /// rest of the viewport.
    #[serde(default = "default_price_axis_width")]
    pub price_axis_width: f64,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
    #[serde(default)]
    pub time_scale: TimeScaleOptions,
    #[serde(default)]
    pub price_scale: PriceScaleOptions,
    #[serde(default)]
    pub hit_test: HitTestConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
}

impl ChartSurfaceConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            price_axis_width: default_price_axis_width(),
            device_pixel_ratio: default_device_pixel_ratio(),
            time_scale: TimeScaleOptions::default(),
            price_scale: PriceScaleOptions::default(),
            hit_test: HitTestConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }

    #[must_use]
    pub fn with_price_axis_width(mut self, width: f64) -> Self {
        self.price_axis_width = width;
        self
    }

    #[must_use]
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_time_scale(mut self, options: TimeScaleOptions) -> Self {
        self.time_scale = options;
        self
    }

    #[must_use]
    pub fn with_price_scale(mut self, options: PriceScaleOptions) -> Self {
        self.price_scale = options;
        self
    }

    #[must_use]
    pub fn with_hit_test(mut self, hit_test: HitTestConfig) -> Self {
        self.hit_test = hit_test;
        self
    }

    #[must_use]
    pub fn with_interaction(mut self, interaction: InteractionConfig) -> Self {
        self.interaction = interaction;
        self
    }

    /// Plot area width in CSS pixels.
    #[must_use]
    pub fn plot_width(&self) -> f64 {
        f64::from(self.viewport.width) - self.price_axis_width
    }

    pub fn validate(self) -> ChartResult<Self> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        if !self.price_axis_width.is_finite() || self.price_axis_width < 0.0 {
            return Err(ChartError::InvalidConfig(
                "price axis width must be finite and >= 0".to_owned(),
            ));
        }
        if self.plot_width() <= 0.0 {
            return Err(ChartError::InvalidConfig(format!(
                "price axis width {} leaves no plot area in a {}px viewport",
                self.price_axis_width, self.viewport.width
            )));
        }
        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "device pixel ratio must be finite and > 0".to_owned(),
            ));
        }
        self.time_scale.validate()?;
        self.price_scale.validate()?;
        self.interaction.validate()?;
        self.manager_options().validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn manager_options(&self) -> DrawingManagerOptions {
        DrawingManagerOptions {
            continuous_drawing: self.interaction.continuous_drawing,
            freehand_min_step_px: self.interaction.freehand_min_step_px,
            hit_test: self.hit_test,
        }
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ChartError::InvalidData(format!("failed to serialize surface config: {e}"))
        })
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidData(format!("failed to parse surface config: {e}"))
        })?;
        config.validate()
    }
}
