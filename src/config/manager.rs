//! Holds the active settings of a workspace.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    CatalogSettings,
    ConfigError,
    loader,
};

/// Validated settings and the file they came from.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    settings: CatalogSettings,
    /// `None` while the defaults are in effect.
    source: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `.ts-catalog.json` under `root`, or the defaults when the
    /// workspace has none.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated. The
    /// previous settings stay active.
    pub fn load_workspace(&mut self, root: &Path) -> Result<&CatalogSettings, ConfigError> {
        match loader::find_config_file(root) {
            Some(path) => self.load_file(&path),
            None => {
                tracing::debug!(root = %root.display(), "No settings file, using defaults");
                self.apply(CatalogSettings::default(), None)
            }
        }
    }

    /// Uses the settings file at `path`.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated. The
    /// previous settings stay active.
    pub fn load_file(&mut self, path: &Path) -> Result<&CatalogSettings, ConfigError> {
        let settings = loader::read_config_file(path)?;
        self.apply(settings, Some(path.to_path_buf()))
    }

    fn apply(
        &mut self,
        settings: CatalogSettings,
        source: Option<PathBuf>,
    ) -> Result<&CatalogSettings, ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(source = ?source, "Settings applied: {:?}", settings);
        self.settings = settings;
        self.source = source;
        Ok(&self.settings)
    }

    #[must_use]
    pub const fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// The settings file in effect.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
