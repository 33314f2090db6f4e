use thiserror::Error;

/// Errors originating from the calculation and rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cancelled")]
    Cancelled,

    #[error("corrupt {kind} buffer: {actual} bytes, expected {expected}")]
    CorruptBuffer {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("value grid incomplete: {filled} of {expected} cells computed")]
    IncompleteGrid { filled: usize, expected: usize },

    #[error("value grid does not match settings: {reason}")]
    GridMismatch { reason: String },

    #[error("invalid gradient scheme: {reason}")]
    InvalidScheme { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] almondbread_core::CoreError),
}
