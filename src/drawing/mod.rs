//! Drawing subsystem: variant model, geometry kernel, projection,
//! hit-testing, the manager and the persistence codec.

pub mod codec;
pub mod geometry;
pub mod hit_test;
pub mod manager;
pub mod model;
pub mod projection;

pub use codec::{DRAWINGS_JSON_SCHEMA_V1, DrawingRecord, DrawingsJsonContractV1, LoadReport};
pub use geometry::{EllipseParams, RegressionLine};
pub use hit_test::{HitPart, HitTarget, HitTestConfig};
pub use manager::{CreationEvent, DrawingManager, DrawingManagerOptions};
pub use model::{
    ArrowDirection, Arity, Drawing, DrawingId, DrawingKind, DrawingState, DrawingStyle, LineDash,
};
pub use projection::{
    DrawingGeometry, FibLevel, GeometryCache, GeometryDetails, InfoLineStats, Projection, Shape,
    project_drawing,
};
