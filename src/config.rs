//! `.ts-catalog.json` settings.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Catalog file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use matcher::{
    CatalogMatcher,
    MatcherError,
};
pub use types::{
    CatalogSettings,
    ConfigError,
    DiagnosticsConfig,
    LoadingConfig,
    LocationsMode,
    LookupConfig,
    MergeConfig,
    Severity,
    TranslationFilesConfig,
    ValidationError,
};
