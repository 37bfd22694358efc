use tracing::{debug, trace};

use crate::core::LogicalPoint;
use crate::drawing::{CreationEvent, DrawingId, HitPart};
use crate::error::ChartResult;
use crate::interaction::{InteractionState, Key, PointerEvent, WheelAction, WheelEvent};
use crate::render::DrawingRenderer;

use super::{ChartSurface, surface::surface_projection};

impl<R: DrawingRenderer> ChartSurface<R> {
    /// Routes a pointer press: price-axis strip → price rescale, armed tool →
    /// creation, drawing under the pointer → drag, empty plot → pan.
    pub fn pointer_down(&mut self, event: PointerEvent) -> ChartResult<InteractionState> {
        if !event.is_finite() {
            return Ok(self.interaction);
        }
        // A press without the matching release still closes the old drag.
        self.end_drag();
        self.refresh_geometry();

        let pixel = event.position();
        let next = if event.x >= self.config.plot_width() {
            self.price_scale.start_scale(event.y);
            InteractionState::ScalingPrice
        } else if self.drawings.tool().is_some() {
            let projection = surface_projection(
                &self.time_scale,
                &self.price_scale,
                &self.bars,
                self.config.device_pixel_ratio,
            );
            let outcome = self.drawings.creation_pointer_down(&projection, pixel);
            trace!(?outcome, "creation pointer down");
            InteractionState::Idle
        } else if let Some(target) = self.drawings.select_drawing_at(pixel) {
            self.start_drawing_drag(target.id, target.part, event)
        } else {
            self.time_scale.start_scroll(event.x);
            InteractionState::Panning
        };
        self.interaction = next;
        Ok(next)
    }

    fn start_drawing_drag(
        &mut self,
        id: DrawingId,
        part: HitPart,
        event: PointerEvent,
    ) -> InteractionState {
        let Some(drawing) = self.drawings.get(id) else {
            return InteractionState::Idle;
        };
        if drawing.locked {
            // Locked drawings can be selected but not dragged.
            return InteractionState::Idle;
        }
        let last = self
            .projection()
            .to_logical(event.position(), false);
        let control_point = match part {
            HitPart::ControlPoint(index) => Some(index),
            HitPart::Body => None,
        };
        debug!(%id, ?control_point, "drawing drag started");
        InteractionState::DraggingDrawing {
            id,
            control_point,
            last,
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> ChartResult<InteractionState> {
        if !event.is_finite() {
            return Ok(self.interaction);
        }
        let pixel = event.position();
        let next = match self.interaction {
            InteractionState::Idle => {
                if self.drawings.is_creating() {
                    let projection = surface_projection(
                        &self.time_scale,
                        &self.price_scale,
                        &self.bars,
                        self.config.device_pixel_ratio,
                    );
                    self.drawings.creation_pointer_move(&projection, pixel);
                }
                InteractionState::Idle
            }
            InteractionState::Panning => {
                self.time_scale.scroll_to(event.x);
                self.autoscale();
                InteractionState::Panning
            }
            InteractionState::ScalingPrice => {
                self.price_scale.scale_to(event.y);
                InteractionState::ScalingPrice
            }
            InteractionState::DraggingDrawing {
                id,
                control_point,
                last,
            } => match self.drag_drawing(id, control_point, last, event) {
                Ok(state) => state,
                Err(err) => {
                    // A rejected move (e.g. locked mid-drag) ends the drag.
                    debug!(%id, error = %err, "drawing drag aborted");
                    self.interaction = InteractionState::Idle;
                    return Err(err);
                }
            },
        };
        self.interaction = next;
        Ok(next)
    }

    fn drag_drawing(
        &mut self,
        id: DrawingId,
        control_point: Option<usize>,
        last: LogicalPoint,
        event: PointerEvent,
    ) -> ChartResult<InteractionState> {
        let Some(freehand) = self.drawings.get(id).map(|drawing| drawing.kind.is_freehand()) else {
            return Ok(InteractionState::Idle);
        };
        let projection = self.projection();
        let current = projection.to_logical(event.position(), false);
        let snapped = projection.to_logical(event.position(), !freehand);

        let last = match control_point {
            Some(index) => {
                self.drawings.move_control_point(id, index, snapped)?;
                current
            }
            None => {
                // Anchored drawings move in whole bars; the remainder carries
                // over to the next update.
                let raw_dt = current.time.get() - last.time.get();
                let dt = if freehand { raw_dt } else { raw_dt.round() };
                let dp = current.price.get() - last.price.get();
                self.drawings.move_drawing(id, dt, dp)?;
                LogicalPoint::new(last.time.get() + dt, current.price)
            }
        };
        Ok(InteractionState::DraggingDrawing {
            id,
            control_point,
            last,
        })
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> ChartResult<InteractionState> {
        if event.is_finite() && self.drawings.is_stroking() {
            let projection = surface_projection(
                &self.time_scale,
                &self.price_scale,
                &self.bars,
                self.config.device_pixel_ratio,
            );
            let outcome = self.drawings.creation_pointer_up(&projection, event.position());
            trace!(?outcome, "creation pointer up");
        }
        self.end_drag();
        Ok(self.interaction)
    }

    /// Pointer left the surface: every drag must still be closed.
    pub fn pointer_leave(&mut self) -> InteractionState {
        self.drawings.finish_stroke();
        self.end_drag();
        self.interaction
    }

    /// Pointer capture lost: like leave, but an unfinished stroke is dropped.
    pub fn pointer_cancel(&mut self) -> InteractionState {
        if self.drawings.is_stroking() {
            self.drawings.cancel_creation();
        }
        self.end_drag();
        self.interaction
    }

    /// Finish gesture for open-ended tools. On the price-axis strip it
    /// re-enables auto-scale instead.
    pub fn double_click(&mut self, event: PointerEvent) -> Option<CreationEvent> {
        if event.is_finite() && event.x >= self.config.plot_width() {
            self.price_scale.set_auto_scale(true);
            self.autoscale();
            return None;
        }
        self.drawings.finish_open_ended()
    }

    fn end_drag(&mut self) {
        match self.interaction {
            InteractionState::Panning => self.time_scale.end_scroll(),
            InteractionState::ScalingPrice => self.price_scale.end_scale(),
            InteractionState::DraggingDrawing { id, .. } => {
                debug!(%id, "drawing drag ended");
            }
            InteractionState::Idle => {}
        }
        self.interaction = InteractionState::Idle;
    }

    /// Applies a wheel event. Returns whether the time scale changed.
    pub fn wheel(&mut self, event: WheelEvent) -> bool {
        let action = event.resolve(self.config.interaction);
        trace!(?action, "wheel");
        match action {
            WheelAction::Zoom { x, scale } => self.time_scale.zoom(x, scale),
            WheelAction::Scroll { delta_px } => self.time_scale.scroll_by(delta_px),
            WheelAction::Ignore => return false,
        }
        self.autoscale();
        true
    }

    /// Keyboard shortcuts for creation and selection. Returns whether the key
    /// was consumed.
    pub fn key_down(&mut self, key: Key) -> bool {
        let consumed = self.drawings.handle_key(key);
        let dragged_removed = self
            .interaction
            .dragged_drawing()
            .is_some_and(|id| self.drawings.get(id).is_none());
        if dragged_removed {
            self.interaction = InteractionState::Idle;
        }
        consumed
    }
}
