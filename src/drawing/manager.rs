use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{LogicalPoint, PixelPoint};
use crate::drawing::hit_test::{HitTarget, HitTestConfig, hit_drawing};
use crate::drawing::model::{Arity, Drawing, DrawingId, DrawingKind, DrawingState, DrawingStyle};
use crate::drawing::projection::{GeometryCache, Projection, pixel_distance};
use crate::error::{ChartError, ChartResult};
use crate::interaction::Key;

fn default_freehand_min_step_px() -> f64 {
    2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingManagerOptions {
    /// Keep the tool armed after a drawing completes.
    #[serde(default)]
    pub continuous_drawing: bool,
    /// Minimum pixel distance between consecutive freehand samples.
    #[serde(default = "default_freehand_min_step_px")]
    pub freehand_min_step_px: f64,
    #[serde(default)]
    pub hit_test: HitTestConfig,
}

impl Default for DrawingManagerOptions {
    fn default() -> Self {
        Self {
            continuous_drawing: false,
            freehand_min_step_px: default_freehand_min_step_px(),
            hit_test: HitTestConfig::default(),
        }
    }
}

impl DrawingManagerOptions {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.freehand_min_step_px.is_finite() || self.freehand_min_step_px < 0.0 {
            return Err(ChartError::InvalidConfig(
                "freehand min step must be finite and >= 0".to_owned(),
            ));
        }
        if !self.hit_test.threshold_px.is_finite() || self.hit_test.threshold_px < 0.0 {
            return Err(ChartError::InvalidConfig(
                "hit-test threshold must be finite and >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Result of feeding one gesture to the creation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationEvent {
    Started(DrawingId),
    PointAdded(DrawingId),
    Completed(DrawingId),
    Discarded(DrawingId),
}

#[derive(Debug, Clone, PartialEq)]
struct PendingDrawing {
    drawing: Drawing,
    /// Points confirmed by a click; anything past this is the hover preview.
    committed: usize,
    /// Freehand button held down.
    stroking: bool,
}

/// Owns the drawing collection, the armed tool, the in-progress drawing and
/// the selection.
#[derive(Debug, Clone, Default)]
pub struct DrawingManager {
    drawings: IndexMap<DrawingId, Drawing>,
    pending: Option<PendingDrawing>,
    tool: Option<DrawingKind>,
    selected: Option<DrawingId>,
    next_id: u64,
    options: DrawingManagerOptions,
    geometry: GeometryCache,
}

impl DrawingManager {
    pub fn new(options: DrawingManagerOptions) -> ChartResult<Self> {
        Ok(Self {
            options: options.validate()?,
            next_id: 1,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn options(&self) -> DrawingManagerOptions {
        self.options
    }

    pub fn set_options(&mut self, options: DrawingManagerOptions) -> ChartResult<()> {
        self.options = options.validate()?;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.get(&id)
    }

    /// Stored drawings in insertion order (bottom to top).
    pub fn drawings(&self) -> impl DoubleEndedIterator<Item = &Drawing> {
        self.drawings.values()
    }

    /// Visible drawings followed by the in-progress one.
    pub fn render_list(&self) -> Vec<&Drawing> {
        self.drawings
            .values()
            .chain(self.pending.as_ref().map(|pending| &pending.drawing))
            .filter(|drawing| drawing.visible)
            .collect()
    }

    #[must_use]
    pub fn geometry(&self) -> &GeometryCache {
        &self.geometry
    }

    /// Re-projects every visible drawing, including the in-progress one.
    pub fn rebuild_geometry(&mut self, projection: &Projection<'_>) {
        let pending = self.pending.as_ref().map(|pending| &pending.drawing);
        self.geometry
            .rebuild(self.drawings.values().chain(pending), projection);
    }

    fn allocate_id(&mut self) -> DrawingId {
        let id = DrawingId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    // --- creation -------------------------------------------------------

    #[must_use]
    pub fn tool(&self) -> Option<&DrawingKind> {
        self.tool.as_ref()
    }

    /// Arms (or with `None`, disarms) a creation tool, discarding any
    /// in-progress drawing.
    pub fn set_tool(&mut self, tool: Option<DrawingKind>) {
        self.cancel_creation();
        debug!(tool = tool.as_ref().map(DrawingKind::type_name), "drawing tool set");
        self.tool = tool;
    }

    #[must_use]
    pub fn is_creating(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&Drawing> {
        self.pending.as_ref().map(|pending| &pending.drawing)
    }

    /// Click with a tool armed: starts a drawing or commits the next anchor.
    ///
    /// Returns `None` when no tool is armed.
    pub fn creation_pointer_down(
        &mut self,
        projection: &Projection<'_>,
        pixel: PixelPoint,
    ) -> Option<CreationEvent> {
        let tool = self.tool.clone()?;
        let point = projection.to_logical(pixel, !tool.is_freehand());

        let Some(pending) = self.pending.as_mut() else {
            self.clear_selection();
            let id = self.allocate_id();
            let mut drawing = Drawing::new(id, tool.clone());
            drawing.points.push(point);
            self.pending = Some(PendingDrawing {
                drawing,
                committed: 1,
                stroking: tool.is_freehand(),
            });
            debug!(%id, kind = tool.type_name(), "drawing creation started");
            if tool.arity().is_satisfied_by(1) && !tool.is_open_ended() {
                return self.finish_creation().or(Some(CreationEvent::Started(id)));
            }
            return Some(CreationEvent::Started(id));
        };

        let id = pending.drawing.id;
        if tool.is_freehand() {
            pending.stroking = true;
            return Some(CreationEvent::PointAdded(id));
        }
        pending.drawing.points.truncate(pending.committed);
        pending.drawing.points.push(point);
        pending.committed += 1;
        let complete = match tool.arity() {
            Arity::Exact(n) => pending.committed >= n,
            Arity::OpenEnded { .. } => false,
        };
        trace!(%id, committed = pending.committed, "anchor committed");
        if complete {
            return self.finish_creation();
        }
        Some(CreationEvent::PointAdded(id))
    }

    /// Pointer move while creating: updates the preview anchor or samples a
    /// freehand stroke. Returns whether the in-progress drawing changed.
    pub fn creation_pointer_move(&mut self, projection: &Projection<'_>, pixel: PixelPoint) -> bool {
        let min_step = self.options.freehand_min_step_px;
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let freehand = pending.drawing.kind.is_freehand();
        let point = projection.to_logical(pixel, !freehand);

        if freehand {
            if !pending.stroking {
                return false;
            }
            let far_enough = pending
                .drawing
                .points
                .last()
                .is_none_or(|last| pixel_distance(projection, *last, point) >= min_step);
            if far_enough {
                pending.drawing.points.push(point);
                pending.committed = pending.drawing.points.len();
            }
            return far_enough;
        }

        if pending.drawing.points.len() > pending.committed {
            if let Some(last) = pending.drawing.points.last_mut() {
                *last = point;
            }
        } else {
            pending.drawing.points.push(point);
        }
        true
    }

    /// Pointer release while creating; ends freehand strokes.
    pub fn creation_pointer_up(
        &mut self,
        projection: &Projection<'_>,
        pixel: PixelPoint,
    ) -> Option<CreationEvent> {
        if !self.is_stroking() {
            return None;
        }
        self.creation_pointer_move(projection, pixel);
        self.finish_stroke()
    }

    #[must_use]
    pub fn is_stroking(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.stroking && pending.drawing.kind.is_freehand())
    }

    /// Ends a freehand stroke without a final sample, e.g. when the pointer
    /// leaves the surface.
    pub fn finish_stroke(&mut self) -> Option<CreationEvent> {
        if !self.is_stroking() {
            return None;
        }
        self.finish_creation()
    }

    /// Finish gesture for open-ended tools (double click, `Enter`). Fixed
    /// arity drawings keep waiting for their anchors.
    pub fn finish_open_ended(&mut self) -> Option<CreationEvent> {
        let open_ended = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.drawing.kind.is_open_ended());
        if !open_ended {
            return None;
        }
        self.finish_creation()
    }

    /// Finish gesture: completes the in-progress drawing when its committed
    /// anchors satisfy the variant arity, otherwise discards it.
    pub fn finish_creation(&mut self) -> Option<CreationEvent> {
        let pending = self.pending.take()?;
        let PendingDrawing {
            mut drawing,
            committed,
            ..
        } = pending;
        drawing.points.truncate(committed);
        while drawing.points.len() >= 2
            && drawing.points[drawing.points.len() - 1] == drawing.points[drawing.points.len() - 2]
        {
            drawing.points.pop();
        }

        let id = drawing.id;
        if !drawing.kind.arity().is_satisfied_by(drawing.points.len()) {
            debug!(%id, points = drawing.points.len(), "drawing discarded: arity not met");
            return Some(CreationEvent::Discarded(id));
        }
        drawing.state = DrawingState::Complete;
        debug!(%id, kind = drawing.kind.type_name(), points = drawing.points.len(), "drawing completed");
        self.drawings.insert(id, drawing);
        if !self.options.continuous_drawing {
            self.tool = None;
        }
        Some(CreationEvent::Completed(id))
    }

    /// Drops the in-progress drawing without completing it.
    pub fn cancel_creation(&mut self) -> Option<CreationEvent> {
        let pending = self.pending.take()?;
        debug!(id = %pending.drawing.id, "drawing creation cancelled");
        Some(CreationEvent::Discarded(pending.drawing.id))
    }

    // --- selection ------------------------------------------------------

    #[must_use]
    pub fn selected(&self) -> Option<DrawingId> {
        self.selected
    }

    /// Hit-tests against the cached geometry, topmost drawing first.
    #[must_use]
    pub fn hit_test(&self, pixel: PixelPoint) -> Option<HitTarget> {
        self.drawings
            .values()
            .rev()
            .filter(|drawing| drawing.visible)
            .find_map(|drawing| {
                let geometry = self.geometry.get(drawing.id)?;
                hit_drawing(drawing.id, geometry, pixel, self.options.hit_test)
            })
    }

    /// Selects the topmost drawing under `pixel`, or clears the selection.
    pub fn select_drawing_at(&mut self, pixel: PixelPoint) -> Option<HitTarget> {
        let target = self.hit_test(pixel);
        trace!(x = pixel.x, y = pixel.y, ?target, "select drawing at");
        match target {
            Some(target) => {
                self.set_selected(Some(target.id));
            }
            None => self.clear_selection(),
        }
        target
    }

    pub fn select(&mut self, id: DrawingId) -> ChartResult<()> {
        if !self.drawings.contains_key(&id) {
            return Err(ChartError::DrawingNotFound(id.0));
        }
        self.set_selected(Some(id));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.set_selected(None);
    }

    fn set_selected(&mut self, id: Option<DrawingId>) {
        if let Some(drawing) = self
            .selected
            .take()
            .and_then(|previous| self.drawings.get_mut(&previous))
        {
            drawing.state = DrawingState::Complete;
        }
        if let Some(drawing) = id.and_then(|id| self.drawings.get_mut(&id)) {
            drawing.state = DrawingState::Selected;
            self.selected = Some(drawing.id);
        }
    }

    // --- collection and mutation -----------------------------------------

    /// Adds a complete drawing built from host-supplied anchors.
    pub fn add(&mut self, kind: DrawingKind, points: Vec<LogicalPoint>) -> ChartResult<DrawingId> {
        let id = DrawingId(self.next_id.max(1));
        let drawing = Drawing::complete(id, kind, points)?;
        self.next_id = id.0 + 1;
        self.drawings.insert(id, drawing);
        debug!(%id, "drawing added");
        Ok(id)
    }

    /// Inserts a validated drawing under its own id, replacing any drawing
    /// with the same id. The id counter moves past it.
    pub fn insert(&mut self, mut drawing: Drawing) -> ChartResult<DrawingId> {
        drawing.validate()?;
        if drawing.state == DrawingState::Creating {
            return Err(ChartError::InvalidRecord(format!(
                "{} is still being created",
                drawing.id
            )));
        }
        drawing.state = DrawingState::Complete;
        let id = drawing.id;
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.drawings.insert(id, drawing);
        Ok(id)
    }

    pub fn remove(&mut self, id: DrawingId) -> ChartResult<Drawing> {
        let drawing = self
            .drawings
            .shift_remove(&id)
            .ok_or(ChartError::DrawingNotFound(id.0))?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.geometry.remove(id);
        debug!(%id, "drawing removed");
        Ok(drawing)
    }

    /// Removes the selected drawing, locked or not.
    pub fn remove_selected(&mut self) -> Option<Drawing> {
        let id = self.selected?;
        self.remove(id).ok()
    }

    /// Removes every drawing and any in-progress creation.
    pub fn clear(&mut self) {
        self.cancel_creation();
        self.drawings.clear();
        self.geometry.clear();
        self.selected = None;
        debug!("drawings cleared");
    }

    fn get_mut(&mut self, id: DrawingId) -> ChartResult<&mut Drawing> {
        self.drawings
            .get_mut(&id)
            .ok_or(ChartError::DrawingNotFound(id.0))
    }

    pub fn move_drawing(
        &mut self,
        id: DrawingId,
        delta_time: f64,
        delta_price: f64,
    ) -> ChartResult<()> {
        self.get_mut(id)?.translate(delta_time, delta_price)
    }

    pub fn move_control_point(
        &mut self,
        id: DrawingId,
        index: usize,
        point: LogicalPoint,
    ) -> ChartResult<()> {
        self.get_mut(id)?.move_control_point(index, point)
    }

    /// Style edits are allowed on locked drawings.
    pub fn set_style(&mut self, id: DrawingId, style: DrawingStyle) -> ChartResult<()> {
        let style = style.validate()?;
        self.get_mut(id)?.style = style;
        Ok(())
    }

    pub fn set_locked(&mut self, id: DrawingId, locked: bool) -> ChartResult<()> {
        self.get_mut(id)?.locked = locked;
        Ok(())
    }

    pub fn set_visible(&mut self, id: DrawingId, visible: bool) -> ChartResult<()> {
        let drawing = self.get_mut(id)?;
        drawing.visible = visible;
        if !visible && self.selected == Some(id) {
            self.clear_selection();
        }
        Ok(())
    }

    /// Keyboard shortcuts. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => {
                if let Some(pending) = &self.pending {
                    let finishable = pending.drawing.kind.is_open_ended()
                        && pending.committed >= 2;
                    if finishable {
                        self.finish_creation();
                    } else {
                        self.cancel_creation();
                    }
                    return true;
                }
                if self.selected.is_some() {
                    self.clear_selection();
                    return true;
                }
                if self.tool.is_some() {
                    self.tool = None;
                    return true;
                }
                false
            }
            Key::Enter => self.finish_open_ended().is_some(),
            Key::Delete | Key::Backspace => {
                if self.pending.is_some() {
                    return false;
                }
                self.remove_selected().is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CreationEvent, DrawingManager, DrawingManagerOptions};
    use crate::core::{LogicalPoint, PixelPoint, PriceRange, PriceScale, TimeScale};
    use crate::drawing::model::{DrawingKind, DrawingState};
    use crate::drawing::projection::Projection;
    use crate::interaction::Key;

    fn scales() -> (TimeScale, PriceScale) {
        let mut time_scale = TimeScale::default();
        time_scale.set_width(800.0).expect("width");
        time_scale.set_points_count(100);
        let mut price_scale = PriceScale::default();
        price_scale.set_height(400.0).expect("height");
        price_scale.set_price_range(Some(PriceRange::new(0.0, 200.0)));
        (time_scale, price_scale)
    }

    fn at(projection: &Projection<'_>, time: f64, price: f64) -> PixelPoint {
        projection.to_pixel(LogicalPoint::new(time, price))
    }

    #[test]
    fn single_anchor_tool_completes_on_first_click() {
        let (time_scale, price_scale) = scales();
        let projection = Projection::new(&time_scale, &price_scale);
        let mut manager = DrawingManager::new(DrawingManagerOptions::default()).expect("manager");
        manager.set_tool(Some(DrawingKind::HorizontalLine));
        let event = manager.creation_pointer_down(&projection, at(&projection, 50.0, 120.0));
        assert!(matches!(event, Some(CreationEvent::Completed(_))));
        assert_eq!(manager.len(), 1);
        assert!(manager.tool().is_none());
    }

    #[test]
    fn escape_discards_incomplete_channel() {
        let (time_scale, price_scale) = scales();
        let projection = Projection::new(&time_scale, &price_scale);
        let mut manager = DrawingManager::new(DrawingManagerOptions::default()).expect("manager");
        manager.set_tool(Some(DrawingKind::ParallelChannel));
        manager.creation_pointer_down(&projection, at(&projection, 40.0, 100.0));
        manager.creation_pointer_down(&projection, at(&projection, 60.0, 120.0));
        assert!(manager.handle_key(Key::Escape));
        assert!(manager.is_empty());
        assert!(!manager.is_creating());
    }

    #[test]
    fn escape_finishes_polyline_with_two_points() {
        let (time_scale, price_scale) = scales();
        let projection = Projection::new(&time_scale, &price_scale);
        let mut manager = DrawingManager::new(DrawingManagerOptions::default()).expect("manager");
        manager.set_tool(Some(DrawingKind::Polyline));
        manager.creation_pointer_down(&projection, at(&projection, 40.0, 100.0));
        manager.creation_pointer_down(&projection, at(&projection, 60.0, 120.0));
        manager.creation_pointer_move(&projection, at(&projection, 70.0, 90.0));
        assert!(manager.handle_key(Key::Escape));
        let drawing = manager.drawings().next().expect("polyline");
        assert_eq!(drawing.points.len(), 2);
        assert_eq!(drawing.state, DrawingState::Complete);
    }

    #[test]
    fn freehand_filters_jitter_below_min_step() {
        let (time_scale, price_scale) = scales();
        let projection = Projection::new(&time_scale, &price_scale);
        let mut manager = DrawingManager::new(DrawingManagerOptions::default()).expect("manager");
        manager.set_tool(Some(DrawingKind::Brush));
        manager.creation_pointer_down(&projection, PixelPoint::new(100.0, 100.0));
        assert!(!manager.creation_pointer_move(&projection, PixelPoint::new(100.5, 100.5)));
        assert!(manager.creation_pointer_move(&projection, PixelPoint::new(110.0, 100.0)));
        let event = manager.creation_pointer_up(&projection, PixelPoint::new(120.0, 104.0));
        assert!(matches!(event, Some(CreationEvent::Completed(_))));
        assert_eq!(manager.drawings().next().expect("brush").points.len(), 3);
    }

    #[test]
    fn locked_drawing_rejects_moves_but_accepts_style() {
        let mut manager = DrawingManager::new(DrawingManagerOptions::default()).expect("manager");
        let id = manager
            .add(
                DrawingKind::TrendLine,
                vec![LogicalPoint::new(1.0, 10.0), LogicalPoint::new(5.0, 20.0)],
            )
            .expect("add");
        manager.set_locked(id, true).expect("lock");
        assert!(manager.move_drawing(id, 1.0, 1.0).is_err());
        let mut style = manager.get(id).expect("drawing").style;
        style.line_width = 4.0;
        manager.set_style(id, style).expect("style");
        assert_eq!(manager.get(id).expect("drawing").style.line_width, 4.0);
    }
}
