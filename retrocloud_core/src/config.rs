//! Launcher configuration, read from an optional JSON file.
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::catalog::UnknownConsolePolicy;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// What the library shows for a console id the catalog does not know.
    pub unknown_console: UnknownConsolePolicy,
    /// Show the animated placeholder when a ROM cannot run. If false a static error screen is
    /// shown instead.
    pub fallback_on_failure: bool,
    pub fallback_fps: u32,
    /// Start emulation as soon as a ROM has loaded instead of waiting for the play button.
    pub autostart: bool,
    /// How long Select and Start stay pressed after a tap.
    pub tap_release_ms: u64,
    pub controls_hint_secs: f32,
    /// Directory ROM URLs are resolved against on native builds.
    pub rom_root: PathBuf,
    /// Replaces the embedded catalog.
    pub catalog_path: Option<PathBuf>,
    pub start_fullscreen: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            unknown_console: UnknownConsolePolicy::Empty,
            fallback_on_failure: true,
            fallback_fps: 30,
            autostart: true,
            tap_release_ms: 100,
            controls_hint_secs: 3.0,
            rom_root: PathBuf::from("public"),
            catalog_path: None,
            start_fullscreen: false,
        }
    }
}

impl LauncherConfig {
    pub fn from_json_str(json: &str) -> Result<LauncherConfig> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(deserializer)
            .map_err(|err| anyhow::anyhow!("Invalid config at `{}`: {}", err.path(), err))
    }

    pub fn from_json_file(path: &Path) -> Result<LauncherConfig> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Cannot load {}", path.display()))
    }

    /// Loads the configured catalog, or the embedded one, with the configured lookup policy.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let catalog = match &self.catalog_path {
            Some(path) => Catalog::from_json_file(path)?,
            None => Catalog::embedded()?,
        };
        Ok(catalog.with_unknown_console_policy(self.unknown_console))
    }
}
