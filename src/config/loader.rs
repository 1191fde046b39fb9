//! Locating and reading `.ts-catalog.json`.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    CatalogSettings,
    ConfigError,
};

pub(super) const CONFIG_FILE_NAME: &str = ".ts-catalog.json";

/// The settings file directly under `root`, if there is one.
pub(super) fn find_config_file(root: &Path) -> Option<PathBuf> {
    let path = root.join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Parses a settings file. Missing fields take their defaults.
///
/// # Errors
/// Returns error if the file cannot be read or is not valid settings JSON.
pub(super) fn read_config_file(path: &Path) -> Result<CatalogSettings, ConfigError> {
    tracing::debug!(path = %path.display(), "Reading settings file");
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
