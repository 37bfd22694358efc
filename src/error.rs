use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown drawing type `{0}`")]
    UnknownDrawingType(String),

    #[error("invalid drawing record: {0}")]
    InvalidRecord(String),

    #[error("drawing {0} not found")]
    DrawingNotFound(u64),

    #[error("drawing {0} is locked")]
    DrawingLocked(u64),
}
