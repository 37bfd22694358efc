use crate::error::ChartResult;
use crate::render::{DrawingPass, DrawingRenderer};

/// No-op renderer used by tests and headless usage.
///
/// It still builds and validates the frame so tests catch invalid geometry
/// without a real backend.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub passes: usize,
    pub last_drawing_count: usize,
    pub last_line_count: usize,
    pub last_fill_count: usize,
    pub last_handle_count: usize,
}

impl DrawingRenderer for NullRenderer {
    fn render_drawings(&mut self, pass: &DrawingPass<'_>) -> ChartResult<()> {
        let frame = pass.build_frame();
        frame.validate()?;
        self.passes += 1;
        self.last_drawing_count = pass.drawings.len();
        self.last_line_count = frame.lines.len();
        self.last_fill_count = frame.fills.len();
        self.last_handle_count = frame.handles.len();
        Ok(())
    }
}
