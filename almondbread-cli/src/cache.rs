use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use almondbread_core::GridSettings;
use almondbread_render::{PixelBuffer, ValueGrid};

use crate::document::{ImageDocument, SettingsChange};
use crate::error::CliError;

/// What the sidecar caches were produced from.
///
/// The value grid and the image are tracked separately so a render that is
/// cancelled or fails to export never makes a finished grid look stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheState {
    /// Settings the persisted value grid was calculated for.
    #[serde(default)]
    pub values: Option<GridSettings>,
    /// Document the cached image was rendered and exported from.
    #[serde(default)]
    pub image: Option<ImageDocument>,
}

impl CacheState {
    /// Classify how `doc` differs from what the caches hold. A cache with no
    /// record counts as changed in every respect it covers.
    pub fn change_for(&self, doc: &ImageDocument) -> SettingsChange {
        let dimensional = self.values.as_ref() != Some(&doc.settings);
        match &self.image {
            Some(image) => {
                let change = image.compare(doc);
                SettingsChange {
                    cosmetic: change.cosmetic,
                    rendering: change.rendering || change.dimensional,
                    dimensional,
                }
            }
            None => SettingsChange {
                dimensional,
                ..SettingsChange::ALL
            },
        }
    }

    /// Forget the caches `change` has just invalidated.
    pub fn forget(&mut self, change: SettingsChange) {
        if change.needs_calculation() {
            self.values = None;
        }
        if change.needs_render() || change.cosmetic {
            self.image = None;
        }
    }
}

/// Sidecar files kept next to a document.
///
/// `state` records what the other two were produced from. Every cache is
/// optional: anything missing, unreadable or stale is simply recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub state: PathBuf,
    pub values: PathBuf,
    pub image: PathBuf,
}

impl CachePaths {
    /// Derive `<stem>.state.json`, `<stem>.values` and `<stem>.png` from the
    /// document path. `output` overrides where the PNG goes.
    pub fn for_document(document: &Path, output: Option<&Path>) -> Self {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let dir = document.parent().unwrap_or_else(|| Path::new(""));
        Self {
            state: dir.join(format!("{stem}.state.json")),
            values: dir.join(format!("{stem}.values")),
            image: output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.join(format!("{stem}.png"))),
        }
    }

    /// What the caches were last produced from. Missing or unreadable state
    /// means nothing is known about them.
    pub fn load_state(&self) -> CacheState {
        let json = match fs::read_to_string(&self.state) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No cache state at {}", self.state.display());
                return CacheState::default();
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", self.state.display());
                return CacheState::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring cache state {}: {e}", self.state.display());
                CacheState::default()
            }
        }
    }

    pub fn save_state(&self, state: &CacheState) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(state).map_err(|source| CliError::Parse {
            path: self.state.clone(),
            source,
        })?;
        fs::write(&self.state, json).map_err(|source| CliError::Write {
            path: self.state.clone(),
            source,
        })?;
        debug!("Saved cache state to {}", self.state.display());
        Ok(())
    }

    /// Delete the caches `change` makes stale.
    pub fn invalidate(&self, change: SettingsChange) -> Result<(), CliError> {
        if change.needs_calculation() {
            remove_if_present(&self.values)?;
        }
        if change.needs_render() {
            remove_if_present(&self.image)?;
        }
        Ok(())
    }

    /// Restore the persisted value grid for `settings`. A missing file gives
    /// an empty grid; a corrupt one is logged and discarded.
    pub fn load_values(&self, settings: &GridSettings) -> ValueGrid {
        match fs::read(&self.values) {
            Ok(bytes) => ValueGrid::restore(settings, &bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => ValueGrid::empty(settings),
            Err(e) => {
                warn!("Failed to read {}: {e}", self.values.display());
                ValueGrid::empty(settings)
            }
        }
    }

    pub fn save_values(&self, grid: &ValueGrid) -> Result<(), CliError> {
        fs::write(&self.values, grid.to_bytes()).map_err(|source| CliError::Write {
            path: self.values.clone(),
            source,
        })?;
        debug!(
            filled = grid.filled(),
            "Saved value grid to {}",
            self.values.display()
        );
        Ok(())
    }

    /// A previously exported image, if it decodes and matches the grid size.
    pub fn load_image(&self, settings: &GridSettings) -> Option<PixelBuffer> {
        if !self.image.exists() {
            return None;
        }
        let image = match image::open(&self.image) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                warn!("Failed to decode {}: {e}", self.image.display());
                return None;
            }
        };
        let buffer = PixelBuffer::from_image(image);
        if (buffer.width, buffer.height) != (settings.width, settings.height) {
            warn!(
                "Cached image is {}x{}, expected {}x{}; re-rendering",
                buffer.width, buffer.height, settings.width, settings.height
            );
            return None;
        }
        info!("Reusing cached image {}", self.image.display());
        Some(buffer)
    }
}

fn remove_if_present(path: &Path) -> Result<(), CliError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale cache {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CliError::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}
