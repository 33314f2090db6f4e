use thiserror::Error;

/// Errors originating from grid settings validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid grid dimensions: {width}×{height} (both must be > 0)")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid pixel size: {0} (must be positive and finite)")]
    InvalidPixelSize(f64),

    #[error("invalid center: ({x}, {y}) (must be finite)")]
    InvalidCenter { x: f64, y: f64 },
}
