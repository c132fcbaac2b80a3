use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::rig::{BuildOptions, Transform};

/// Persisted rig settings used by CLI workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigSettings {
    pub build: BuildOptions,
    pub write_diagnostic: bool,
    /// Overrides the `<input>.diagnostic.json` default.
    pub diagnostic_path: Option<String>,
    /// Local transforms applied by joint name before the pose is evaluated.
    pub pose: BTreeMap<String, Transform>,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            build: BuildOptions::default(),
            write_diagnostic: true,
            diagnostic_path: None,
            pose: BTreeMap::new(),
        }
    }
}

/// Save rig settings to a JSON file.
pub fn save_rig_settings(path: &Path, settings: &RigSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)
        .context("failed to serialize rig settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save rig settings: {}", path.display()))?;
    Ok(())
}

/// Load rig settings from a JSON file.
pub fn load_rig_settings(path: &Path) -> Result<RigSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load rig settings: {}", path.display()))?;
    let settings: RigSettings =
        serde_json::from_str(&content).context("failed to parse rig settings JSON")?;
    Ok(settings)
}
