use std::path::PathBuf;

use thiserror::Error;

use almondbread_core::CoreError;
use almondbread_render::RenderError;

/// Failures surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid settings: {0}")]
    Settings(#[from] CoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
