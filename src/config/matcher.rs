//! Decides which files in a workspace are catalogs.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::CatalogSettings;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("{setting}: invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        setting: &'static str,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to compile patterns: {0}")]
    Compile(#[from] globset::Error),
}

/// Compiled include and exclude globs, evaluated against paths relative to
/// the workspace root.
#[derive(Debug, Clone)]
pub struct CatalogMatcher {
    root: PathBuf,
    include: GlobSet,
    /// Top-level `excludePatterns` and `translationFiles.excludePatterns` combined.
    exclude: GlobSet,
}

impl CatalogMatcher {
    /// # Errors
    /// Returns error if any pattern is not a valid glob.
    pub fn new(root: PathBuf, settings: &CatalogSettings) -> Result<Self, MatcherError> {
        let mut include = GlobSetBuilder::new();
        add_patterns(
            &mut include,
            "translationFiles.includePatterns",
            &settings.translation_files.include_patterns,
        )?;

        let mut exclude = GlobSetBuilder::new();
        add_patterns(&mut exclude, "excludePatterns", &settings.exclude_patterns)?;
        add_patterns(
            &mut exclude,
            "translationFiles.excludePatterns",
            &settings.translation_files.exclude_patterns,
        )?;

        Ok(Self { root, include: include.build()?, exclude: exclude.build()? })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is a catalog. Absolute paths outside the root never are;
    /// relative paths are taken as relative to the root.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(relative) => relative,
                Err(_) => return false,
            }
        } else {
            path
        };
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

fn add_patterns(
    builder: &mut GlobSetBuilder,
    setting: &'static str,
    patterns: &[String],
) -> Result<(), MatcherError> {
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| MatcherError::InvalidPattern {
            setting,
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    Ok(())
}
