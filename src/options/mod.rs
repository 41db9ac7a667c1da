//! Choreography options with TOML preset support.
//!
//! Every tunable (durations, easing, tracking, watchdog buffers) lives here.
//! Options serialize to/from TOML so presets can be kept on disk and loaded
//! by the replay binary.

mod entrance;
mod fade;
mod flip;
mod overlay;
mod watchdog;

use std::path::Path;

pub use entrance::EntranceOptions;
pub use fade::FadeOptions;
pub use flip::FlipOptions;
pub use overlay::OverlayOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use watchdog::WatchdogOptions;

use crate::error::SegueError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[overlay]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Layout-change animation.
    pub flip: FlipOptions,
    /// Route slide.
    pub overlay: OverlayOptions,
    /// Route cross-fade.
    pub fade: FadeOptions,
    /// Single-element entrance.
    pub entrance: EntranceOptions,
    /// Completion timers.
    pub watchdog: WatchdogOptions,
}

impl Options {
    /// Generate JSON Schema describing the options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, SegueError> {
        let content = std::fs::read_to_string(path).map_err(SegueError::Io)?;
        toml::from_str(&content)
            .map_err(|e| SegueError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), SegueError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SegueError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SegueError::Io)?;
        }
        std::fs::write(path, content).map_err(SegueError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}
