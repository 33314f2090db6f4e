use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use almondbread_core::GridSettings;
use almondbread_render::BuiltinScheme;

use crate::error::CliError;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A saved image: what to calculate and how to color it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDocument {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_settings")]
    pub settings: GridSettings,
    #[serde(default)]
    pub scheme: BuiltinScheme,
}

fn default_name() -> String {
    "Untitled".to_string()
}

/// A seahorse-valley close-up, the view new documents start from.
fn default_settings() -> GridSettings {
    GridSettings {
        width: 800,
        height: 600,
        center_x: -0.7412067031270126,
        center_y: -0.1207678370473447,
        pixel_size: 1.0940668476076224e-11,
        max_iterations: GridSettings::DEFAULT_MAX_ITERATIONS,
    }
}

impl Default for ImageDocument {
    fn default() -> Self {
        Self {
            name: default_name(),
            settings: default_settings(),
            scheme: BuiltinScheme::default(),
        }
    }
}

impl ImageDocument {
    /// Read and validate a document.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let json = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Self = serde_json::from_str(&json).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        doc.settings.validate()?;
        info!("Loaded document \"{}\" from {}", doc.name, path.display());
        Ok(doc)
    }

    /// Write the document as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let write_err = |source| CliError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)?;
        debug!("Saved document to {}", path.display());
        Ok(())
    }

    /// Classify what differs between `self` (what the caches were built
    /// from) and `edited`.
    pub fn compare(&self, edited: &ImageDocument) -> SettingsChange {
        SettingsChange {
            cosmetic: self.name != edited.name,
            rendering: self.scheme != edited.scheme,
            dimensional: self.settings != edited.settings,
        }
    }
}

// ---------------------------------------------------------------------------
// Change classification
// ---------------------------------------------------------------------------

/// Which derived data an edit invalidates.
///
/// `dimensional` covers anything that moves or resizes the sampled grid or
/// changes the iteration budget: the value grid must be recalculated.
/// `rendering` only needs a new coloring pass. `cosmetic` needs neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub cosmetic: bool,
    pub rendering: bool,
    pub dimensional: bool,
}

impl SettingsChange {
    pub const ALL: Self = Self {
        cosmetic: true,
        rendering: true,
        dimensional: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.cosmetic || self.rendering || self.dimensional)
    }

    /// The value grid has to be recalculated.
    pub fn needs_calculation(&self) -> bool {
        self.dimensional
    }

    /// The pixel buffer has to be re-rendered.
    pub fn needs_render(&self) -> bool {
        self.dimensional || self.rendering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_documents_have_no_change() {
        let doc = ImageDocument::default();
        assert!(doc.compare(&doc.clone()).is_empty());
    }

    #[test]
    fn rename_is_cosmetic() {
        let doc = ImageDocument::default();
        let mut edited = doc.clone();
        edited.name = "Seahorse".into();
        let change = doc.compare(&edited);
        assert!(change.cosmetic);
        assert!(!change.needs_render());
        assert!(!change.needs_calculation());
    }

    #[test]
    fn scheme_change_only_rerenders() {
        let doc = ImageDocument::default();
        let mut edited = doc.clone();
        edited.scheme = BuiltinScheme::Cool;
        let change = doc.compare(&edited);
        assert!(change.needs_render());
        assert!(!change.needs_calculation());
    }

    #[test]
    fn grid_edits_are_dimensional() {
        let doc = ImageDocument::default();
        let edits: [fn(&mut GridSettings); 6] = [
            |s| s.width += 1,
            |s| s.height += 1,
            |s| s.center_x += 1e-12,
            |s| s.center_y -= 1e-12,
            |s| s.pixel_size *= 2.0,
            |s| s.max_iterations += 1,
        ];
        for edit in edits {
            let mut edited = doc.clone();
            edit(&mut edited.settings);
            let change = doc.compare(&edited);
            assert!(change.needs_calculation(), "{:?}", edited.settings);
            assert!(change.needs_render());
        }
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let doc: ImageDocument = serde_json::from_str(r#"{ "scheme": "cool" }"#).unwrap();
        assert_eq!(doc.name, "Untitled");
        assert_eq!(doc.scheme, BuiltinScheme::Cool);
        assert_eq!(doc.settings, default_settings());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join("almondbread_test_document");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("view.json");

        let mut doc = ImageDocument::default();
        doc.name = "Spiral".into();
        doc.settings = GridSettings::new(320, 200, -0.1, 0.65, 3e-4, 750).unwrap();
        doc.save(&path).expect("save should succeed");
        assert_eq!(ImageDocument::load(&path).expect("load should succeed"), doc);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_settings_are_rejected_on_load() {
        let dir = std::env::temp_dir().join("almondbread_test_document_invalid");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("bad.json");
        std::fs::write(
            &path,
            r#"{ "settings": { "width": 0, "height": 10, "center_x": 0.0,
                "center_y": 0.0, "pixel_size": 0.01, "max_iterations": 10 } }"#,
        )
        .unwrap();
        assert!(matches!(
            ImageDocument::load(&path),
            Err(CliError::Settings(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
