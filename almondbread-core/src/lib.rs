pub mod error;
pub mod point;
pub mod settings;

// Re-export primary types for convenience.
pub use error::CoreError;
pub use point::{evaluate, PointResult, ESCAPE_RADIUS_SQ};
pub use settings::GridSettings;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
