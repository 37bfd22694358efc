use tracing::debug;

use crate::core::{
    BarSeries, DeviceTransform, OhlcBar, PriceScale, TimeScale, Viewport,
};
use crate::drawing::{DrawingManager, Projection};
use crate::error::ChartResult;
use crate::interaction::InteractionState;
use crate::render::{DrawingPass, DrawingRenderer};

use super::ChartSurfaceConfig;

/// Main orchestration facade consumed by host applications.
///
/// `ChartSurface` owns both scales, the bar data, the drawing manager and the
/// pointer state machine, and drives the renderer.
pub struct ChartSurface<R: DrawingRenderer> {
    pub(super) renderer: R,
    pub(super) config: ChartSurfaceConfig,
    pub(super) time_scale: TimeScale,
    pub(super) price_scale: PriceScale,
    pub(super) bars: BarSeries,
    pub(super) drawings: DrawingManager,
    pub(super) interaction: InteractionState,
}

/// Projection over the surface's scales, built from disjoint field borrows
/// so callers can still mutate the drawing manager.
pub(super) fn surface_projection<'a>(
    time_scale: &'a TimeScale,
    price_scale: &'a PriceScale,
    bars: &'a BarSeries,
    device_pixel_ratio: f64,
) -> Projection<'a> {
    Projection::new(time_scale, price_scale)
        .with_bars(bars)
        .with_device(DeviceTransform::new(device_pixel_ratio))
}

impl<R: DrawingRenderer> ChartSurface<R> {
    pub fn new(renderer: R, config: ChartSurfaceConfig) -> ChartResult<Self> {
        let config = config.validate()?;
        let mut time_scale = TimeScale::new(config.time_scale);
        time_scale.set_width(config.plot_width())?;
        let mut price_scale = PriceScale::new(config.price_scale);
        price_scale.set_height(f64::from(config.viewport.height))?;
        let drawings = DrawingManager::new(config.manager_options())?;
        debug!(
            width = config.viewport.width,
            height = config.viewport.height,
            "chart surface created"
        );
        Ok(Self {
            renderer,
            config,
            time_scale,
            price_scale,
            bars: BarSeries::default(),
            drawings,
            interaction: InteractionState::Idle,
        })
    }

    #[must_use]
    pub fn config(&self) -> ChartSurfaceConfig {
        self.config
    }

    #[must_use]
    pub fn time_scale(&self) -> &TimeScale {
        &self.time_scale
    }

    pub fn time_scale_mut(&mut self) -> &mut TimeScale {
        &mut self.time_scale
    }

    #[must_use]
    pub fn price_scale(&self) -> &PriceScale {
        &self.price_scale
    }

    pub fn price_scale_mut(&mut self) -> &mut PriceScale {
        &mut self.price_scale
    }

    #[must_use]
    pub fn drawings(&self) -> &DrawingManager {
        &self.drawings
    }

    pub fn drawings_mut(&mut self) -> &mut DrawingManager {
        &mut self.drawings
    }

    #[must_use]
    pub fn interaction_state(&self) -> InteractionState {
        self.interaction
    }

    #[must_use]
    pub fn bars(&self) -> &BarSeries {
        &self.bars
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    #[must_use]
    pub fn projection(&self) -> Projection<'_> {
        surface_projection(
            &self.time_scale,
            &self.price_scale,
            &self.bars,
            self.config.device_pixel_ratio,
        )
    }

    /// Replaces the bar data and re-runs auto-scale.
    pub fn set_bars(&mut self, bars: BarSeries) {
        self.time_scale.set_points_count(bars.len());
        self.bars = bars;
        self.autoscale();
        debug!(bars = self.bars.len(), "bars replaced");
    }

    pub fn append_bar(&mut self, bar: OhlcBar) {
        self.bars.push(bar);
        self.time_scale.set_points_count(self.bars.len());
        self.autoscale();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> ChartResult<()> {
        let config = ChartSurfaceConfig {
            viewport,
            ..self.config
        }
        .validate()?;
        self.time_scale.set_width(config.plot_width())?;
        self.price_scale.set_height(f64::from(viewport.height))?;
        self.config = config;
        self.autoscale();
        Ok(())
    }

    /// Recomputes the price range from the visible bars when auto-scale is on.
    pub(super) fn autoscale(&mut self) -> bool {
        self.price_scale
            .autoscale(&self.bars, self.time_scale.visible_range())
    }

    /// Re-projects every drawing from current scale state.
    pub fn refresh_geometry(&mut self) {
        let projection = surface_projection(
            &self.time_scale,
            &self.price_scale,
            &self.bars,
            self.config.device_pixel_ratio,
        );
        self.drawings.rebuild_geometry(&projection);
    }

    /// Rebuilds the geometry cache and hands one pass to the renderer.
    pub fn render(&mut self) -> ChartResult<()> {
        self.refresh_geometry();
        let time_scale = &self.time_scale;
        let price_scale = &self.price_scale;
        let time_to_pixel = |index: f64| time_scale.index_to_coordinate(index).get();
        let price_to_pixel = |price: f64| price_scale.price_to_coordinate(price).get();
        let drawings = self.drawings.render_list();
        let pass = DrawingPass {
            drawings: &drawings,
            geometry: self.drawings.geometry(),
            time_to_pixel: &time_to_pixel,
            price_to_pixel: &price_to_pixel,
            viewport: Viewport::new(
                self.config.plot_width().floor() as u32,
                self.config.viewport.height,
            ),
            device: DeviceTransform::new(self.config.device_pixel_ratio),
        };
        self.renderer.render_drawings(&pass)
    }
}
