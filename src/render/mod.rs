mod frame;
mod null_renderer;
mod primitives;

pub use frame::{DrawingFrame, DrawingPass, HANDLE_HALF_SIZE_PX};
pub use null_renderer::NullRenderer;
pub use primitives::{Color, FillPrimitive, HandlePrimitive, LinePrimitive};

use crate::error::ChartResult;

/// Contract implemented by any drawing-layer backend.
///
/// Backends receive the drawings, their cached pixel geometry and the two
/// axis projections; all output is backend side effects.
pub trait DrawingRenderer {
    fn render_drawings(&mut self, pass: &DrawingPass<'_>) -> ChartResult<()>;
}
