use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "translationFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of `.ts-catalog.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    pub translation_files: TranslationFilesConfig,

    /// Directories and files never walked, whatever `translationFiles` says.
    pub exclude_patterns: Vec<String>,

    pub loading: LoadingConfig,
    pub lookup: LookupConfig,
    pub merge: MergeConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self { include_patterns: vec!["**/*.ts".to_string()], exclude_patterns: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadingConfig {
    /// Number of catalogs loaded concurrently.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl LoadingConfig {
    /// Effective concurrency.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupConfig {
    /// Use non-empty `unfinished` translations instead of the source text.
    pub include_unfinished: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self { include_unfinished: true }
    }
}

/// What happens to source locations when merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationsMode {
    /// Keep the locations of the fresh extraction.
    #[default]
    Absolute,
    /// Strip every location.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeConfig {
    /// Keep messages that disappeared from the extraction as `vanished`.
    pub keep_obsolete: bool,
    pub locations: LocationsMode,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { keep_obsolete: true, locations: LocationsMode::Absolute }
    }
}

/// How a diagnostic kind is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Not reported.
    Off,
    #[default]
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    pub unfinished: Severity,
    pub placeholder_mismatch: Severity,
    pub empty_translation: Severity,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            unfinished: Severity::Warning,
            placeholder_mismatch: Severity::Warning,
            empty_translation: Severity::Off,
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            translation_files: TranslationFilesConfig::default(),
            exclude_patterns: vec!["**/node_modules/**".to_string(), "**/target/**".to_string()],
            loading: LoadingConfig::default(),
            lookup: LookupConfig::default(),
            merge: MergeConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl CatalogSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Zero concurrency
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.translation_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/*.ts\"]",
            ));
        }

        let pattern_lists = [
            ("translationFiles.includePatterns", &self.translation_files.include_patterns),
            ("translationFiles.excludePatterns", &self.translation_files.exclude_patterns),
            ("excludePatterns", &self.exclude_patterns),
        ];
        for (field, patterns) in pattern_lists {
            for (index, pattern) in patterns.iter().enumerate() {
                if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if self.loading.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "loading.numThreads",
                "Must be at least 1. Remove the field to use the default",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn validate_valid_settings() {
        let settings = CatalogSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"lookup": {"includeUnfinished": false}, "merge": {"locations": "none"}}"#;

        let settings: CatalogSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.lookup.include_unfinished, eq(false));
        assert_that!(settings.merge.locations, eq(LocationsMode::None));
        assert_that!(settings.merge.keep_obsolete, eq(true));
        assert_that!(settings.translation_files.include_patterns, len(eq(1)));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let json = "{}";

        let settings: CatalogSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.translation_files.include_patterns, elements_are![eq("**/*.ts")]);
        assert_that!(settings.lookup.include_unfinished, eq(true));
        assert_that!(settings.diagnostics.unfinished, eq(Severity::Warning));
        assert_that!(settings.diagnostics.empty_translation, eq(Severity::Off));
        assert_that!(settings.loading.num_threads, none());
        assert_that!(
            settings.exclude_patterns,
            elements_are![eq("**/node_modules/**"), eq("**/target/**")]
        );
    }

    #[rstest]
    fn deserialize_severity_values() {
        let json = r#"{"diagnostics": {"unfinished": "off", "placeholderMismatch": "error"}}"#;

        let settings: CatalogSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.diagnostics.unfinished, eq(Severity::Off));
        assert_that!(settings.diagnostics.placeholder_mismatch, eq(Severity::Error));
    }

    #[rstest]
    fn deserialize_unknown_severity_fails() {
        let json = r#"{"diagnostics": {"unfinished": "fatal"}}"#;

        assert!(serde_json::from_str::<CatalogSettings>(json).is_err());
    }

    #[rstest]
    fn validate_requires_an_include_pattern() {
        let mut settings = CatalogSettings::default();
        settings.translation_files.include_patterns.clear();

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("translationFiles.includePatterns")),
                field!(ValidationError.message, contains_substring("At least one pattern"))
            ]])
        );
    }

    #[rstest]
    #[case::include(&["**/*.{ts,qm"], &[], &[], "translationFiles.includePatterns[0]")]
    #[case::catalog_exclude(&["**/*.ts"], &["nls/*_xx.ts", "[ab"], &[], "translationFiles.excludePatterns[1]")]
    #[case::global_exclude(&["**/*.ts"], &[], &["**/node_modules/**", "build/**", "invalid[pattern"], "excludePatterns[2]")]
    fn validate_reports_bad_glob_position(
        #[case] include: &[&str],
        #[case] catalog_exclude: &[&str],
        #[case] exclude: &[&str],
        #[case] field_path: &str,
    ) {
        let owned = |patterns: &[&str]| -> Vec<String> {
            patterns.iter().map(ToString::to_string).collect()
        };
        let settings = CatalogSettings {
            translation_files: TranslationFilesConfig {
                include_patterns: owned(include),
                exclude_patterns: owned(catalog_exclude),
            },
            exclude_patterns: owned(exclude),
            ..CatalogSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq(field_path)),
                field!(ValidationError.message, contains_substring("Invalid glob pattern"))
            ]])
        );
    }

    #[rstest]
    fn validate_zero_threads() {
        let settings = CatalogSettings {
            loading: LoadingConfig { num_threads: Some(0) },
            ..CatalogSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("loading.numThreads"))])
        );
    }

    #[rstest]
    #[case(Some(3), 3)]
    #[case(Some(1), 1)]
    fn loading_concurrency_uses_explicit_value(
        #[case] num_threads: Option<usize>,
        #[case] expected: usize,
    ) {
        assert_that!(LoadingConfig { num_threads }.concurrency(), eq(expected));
    }

    #[rstest]
    fn loading_concurrency_default_is_positive() {
        assert_that!(LoadingConfig::default().concurrency(), ge(1));
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = CatalogSettings {
            translation_files: TranslationFilesConfig {
                include_patterns: vec![],
                exclude_patterns: vec![],
            },
            loading: LoadingConfig { num_threads: Some(0) },
            ..CatalogSettings::default()
        };

        let errors = settings.validate().unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let error_message = format!("{config_error}");
        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. translationFiles.includePatterns"));
        assert_that!(error_message, contains_substring("2. loading.numThreads"));
    }
}
