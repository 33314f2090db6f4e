pub mod buffer;
pub mod calculator;
pub mod error;
pub mod export;
pub mod gradient;
pub mod histogram;
pub mod progress;
pub mod renderer;
pub mod smooth;
pub mod value_grid;

pub use buffer::PixelBuffer;
pub use calculator::compute;
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use gradient::{builtin_schemes, BuiltinScheme, ControlPoint, GradientScheme, Rgb};
pub use histogram::Palette;
pub use progress::{CancelToken, PROGRESS_INTERVAL};
pub use renderer::{colorize_point, render, RenderSettings};
pub use smooth::smooth_ratio;
pub use value_grid::{BufferState, ValueGrid, RECORD_SIZE};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
