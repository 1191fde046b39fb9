//! Discovery and concurrent loading of the catalogs in a directory tree.

use std::path::{
    Path,
    PathBuf,
};

use futures::StreamExt;
use ignore::WalkBuilder;
use thiserror::Error;

use crate::catalog::{
    Catalog,
    CatalogError,
    parse_catalog,
};
use crate::config::{
    CatalogSettings,
    CatalogMatcher,
    MatcherError,
};

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Workspace root '{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Matcher(#[from] MatcherError),
}

/// Outcome of loading one catalog file.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub path: PathBuf,
    pub result: Result<Catalog, CatalogError>,
}

impl LoadedCatalog {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Finds and loads every catalog under a workspace root.
#[derive(Clone, Debug)]
pub struct WorkspaceLoader {
    matcher: CatalogMatcher,
    concurrency: usize,
}

impl WorkspaceLoader {
    /// # Errors
    /// Returns error if a configured glob pattern is invalid.
    pub fn new(root: &Path, settings: &CatalogSettings) -> Result<Self, WorkspaceError> {
        if !root.is_dir() {
            return Err(WorkspaceError::NotADirectory(root.to_path_buf()));
        }
        let matcher = CatalogMatcher::new(root.to_path_buf(), settings)?;
        Ok(Self { matcher, concurrency: settings.loading.concurrency().max(1) })
    }

    /// Walks the tree and loads every matching catalog.
    ///
    /// Results are sorted by path. One file failing does not stop the others.
    /// Matching files that are not XML at all, such as TypeScript sources
    /// sharing the `.ts` extension, are skipped.
    ///
    /// # Errors
    /// Returns error if the root is not a directory or a pattern is invalid.
    pub async fn load(
        root: &Path,
        settings: &CatalogSettings,
    ) -> Result<Vec<LoadedCatalog>, WorkspaceError> {
        let loader = Self::new(root, settings)?;
        let files = loader.find_catalog_files();
        Ok(loader.load_all(files, true).await)
    }

    /// Catalog files under the root, sorted by path.
    #[must_use]
    pub fn find_catalog_files(&self) -> Vec<PathBuf> {
        let root = self.matcher.root();
        tracing::debug!(workspace_path = %root.display(), "Searching for catalog files");

        let mut found_files = Vec::new();
        for result in WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            if self.matcher.matches(entry.path()) {
                found_files.push(entry.path().to_path_buf());
            }
        }

        found_files.sort();
        tracing::debug!(count = found_files.len(), "Found catalog files");
        found_files
    }

    /// Loads the given files, at most `loading.numThreads` at a time.
    ///
    /// Every file gets a result, whatever its content.
    pub async fn load_files(&self, files: Vec<PathBuf>) -> Vec<LoadedCatalog> {
        self.load_all(files, false).await
    }

    async fn load_all(&self, files: Vec<PathBuf>, skip_foreign: bool) -> Vec<LoadedCatalog> {
        let mut loaded: Vec<LoadedCatalog> = futures::stream::iter(files)
            .map(|path| load_file(path, skip_foreign))
            .buffer_unordered(self.concurrency)
            .filter_map(futures::future::ready)
            .collect()
            .await;
        loaded.sort_by(|a, b| a.path.cmp(&b.path));

        let failed = loaded.iter().filter(|c| !c.is_ok()).count();
        tracing::info!(loaded = loaded.len() - failed, failed, "Loaded workspace catalogs");
        loaded
    }
}

/// Whether `content` could be an XML document. Leading BOM and whitespace are
/// ignored.
fn looks_like_xml(content: &str) -> bool {
    content.trim_start_matches('\u{feff}').trim_start().starts_with('<')
}

async fn load_file(path: PathBuf, skip_foreign: bool) -> Option<LoadedCatalog> {
    let result = match tokio::fs::read_to_string(&path).await {
        Ok(content) if skip_foreign && !looks_like_xml(&content) => {
            tracing::debug!("Skipping {:?}: not an XML document", path);
            return None;
        }
        Ok(content) => parse_catalog(&content)
            .and_then(|catalog| crate::validate::ensure_valid(&catalog).map(|()| catalog)),
        Err(source) => Err(CatalogError::Io { path: path.clone(), source }),
    };
    if let Err(e) = &result {
        tracing::warn!("Failed to load catalog {:?}: {}", path, e);
    } else {
        tracing::debug!("Loaded catalog {:?}", path);
    }
    Some(LoadedCatalog { path, result })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::config::LoadingConfig;

    const VALID: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="en">
<context>
    <name>VBoxGlobal</name>
    <message numerus="yes">
        <source>%n year(s)</source>
        <translation>
            <numerusform>%n year</numerusform>
            <numerusform>%n years</numerusform>
        </translation>
    </message>
</context>
</TS>
"#;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[googletest::test]
    fn test_find_catalog_files_respects_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "nls/VirtualBox_en.ts", VALID);
        write(root, "nls/sub/VirtualBox_en_GB.ts", VALID);
        write(root, "nls/VirtualBox_en.qm", "");
        write(root, "node_modules/pkg/x.ts", VALID);

        let loader = WorkspaceLoader::new(root, &CatalogSettings::default()).unwrap();
        let files: Vec<PathBuf> = loader
            .find_catalog_files()
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        expect_that!(
            files,
            elements_are![
                eq(&PathBuf::from("nls/VirtualBox_en.ts")),
                eq(&PathBuf::from("nls/sub/VirtualBox_en_GB.ts"))
            ]
        );
    }

    #[tokio::test]
    async fn test_load_reports_each_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "a_en.ts", VALID);
        write(root, "b_broken.ts", "<TS><context>");
        write(root, "c_en.ts", VALID);

        let settings = CatalogSettings {
            loading: LoadingConfig { num_threads: Some(2) },
            ..CatalogSettings::default()
        };
        let loaded = WorkspaceLoader::load(root, &settings).await.unwrap();

        assert_eq!(loaded.len(), 3);
        assert!(loaded[0].path.ends_with("a_en.ts"));
        assert!(loaded[0].is_ok());
        assert!(matches!(loaded[1].result, Err(CatalogError::Parse { .. })));
        assert!(loaded[2].is_ok());
    }

    #[tokio::test]
    async fn test_discovery_skips_typescript_sources() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "nls/VirtualBox_en.ts", VALID);
        write(root, "web/app.ts", "import { tr } from './i18n';\nexport const title = tr('Close');\n");
        write(root, "web/broken.ts", "  <TS><context>");

        let loaded = WorkspaceLoader::load(root, &CatalogSettings::default()).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].path.ends_with("nls/VirtualBox_en.ts"));
        assert!(loaded[0].is_ok());
        assert!(loaded[1].path.ends_with("web/broken.ts"));
        assert!(matches!(loaded[1].result, Err(CatalogError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_explicit_files_are_always_reported() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "app.ts", "export {};\n");
        let loader = WorkspaceLoader::new(temp_dir.path(), &CatalogSettings::default()).unwrap();

        let loaded = loader.load_files(vec![temp_dir.path().join("app.ts")]).await;

        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].is_ok());
    }

    #[tokio::test]
    async fn test_load_validates_catalogs() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "bad_en.ts",
            r#"<TS version="2.1" language="en"><context><name>C</name>
<message><source>A</source><translation>a</translation></message>
<message><source>A</source><translation>b</translation></message>
</context></TS>"#,
        );

        let loaded = WorkspaceLoader::load(temp_dir.path(), &CatalogSettings::default()).await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert!(matches!(loaded[0].result, Err(CatalogError::SchemaViolation { .. })));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let loader = WorkspaceLoader::new(temp_dir.path(), &CatalogSettings::default()).unwrap();

        let loaded = loader.load_files(vec![temp_dir.path().join("gone.ts")]).await;

        assert!(matches!(loaded[0].result, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.ts");
        fs::write(&file, VALID).unwrap();

        let result = WorkspaceLoader::new(&file, &CatalogSettings::default());

        assert!(matches!(result, Err(WorkspaceError::NotADirectory(_))));
    }
}
