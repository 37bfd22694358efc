use crate::core::LogicalPoint;
use crate::drawing::{DrawingId, DrawingKind, DrawingStyle, LoadReport};
use crate::error::ChartResult;
use crate::render::DrawingRenderer;

use super::ChartSurface;

impl<R: DrawingRenderer> ChartSurface<R> {
    /// Arms a creation tool; `None` returns the pointer to select/pan.
    pub fn set_drawing_tool(&mut self, tool: Option<DrawingKind>) {
        self.drawings.set_tool(tool);
    }

    /// Adds a complete drawing from logical anchors.
    pub fn add_drawing(
        &mut self,
        kind: DrawingKind,
        points: Vec<LogicalPoint>,
    ) -> ChartResult<DrawingId> {
        self.drawings.add(kind, points)
    }

    pub fn remove_drawing(&mut self, id: DrawingId) -> ChartResult<()> {
        self.drawings.remove(id).map(|_| ())
    }

    pub fn set_drawing_style(&mut self, id: DrawingId, style: DrawingStyle) -> ChartResult<()> {
        self.drawings.set_style(id, style)
    }

    pub fn set_drawing_locked(&mut self, id: DrawingId, locked: bool) -> ChartResult<()> {
        self.drawings.set_locked(id, locked)
    }

    pub fn set_drawing_visible(&mut self, id: DrawingId, visible: bool) -> ChartResult<()> {
        self.drawings.set_visible(id, visible)
    }

    #[must_use]
    pub fn selected_drawing(&self) -> Option<DrawingId> {
        self.drawings.selected()
    }

    pub fn save_drawings_json(&self) -> ChartResult<String> {
        self.drawings.to_json_contract_v1_pretty()
    }

    /// Replaces all drawings from a persisted payload.
    pub fn load_drawings_json(&mut self, input: &str) -> ChartResult<LoadReport> {
        let report = self.drawings.load_json_contract(input)?;
        self.refresh_geometry();
        Ok(report)
    }
}
