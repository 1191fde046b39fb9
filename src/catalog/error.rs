use std::path::PathBuf;

use thiserror::Error;

/// Errors that make a catalog file unusable.
///
/// Every variant is fatal for the file it came from: a partially trusted
/// catalog would show wrong or missing text.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("XML parse error at byte {position}: {message}")]
    Parse { position: u64, message: String },

    /// Well-formed XML that breaks the context/message/translation structure.
    #[error("Schema violation{}: {message}", format_context(.context.as_deref()))]
    SchemaViolation { context: Option<String>, message: String },

    /// A plural message carries the wrong number of variants.
    #[error(
        "Plural count mismatch in context '{context}' for '{source_text}': language '{language}' requires {expected} forms, found {found}"
    )]
    PluralCountMismatch {
        context: String,
        source_text: String,
        language: String,
        expected: usize,
        found: usize,
    },

    /// No plural rule is known for the declared language.
    #[error("Unsupported language '{0}': no plural rule is available")]
    UnsupportedLanguage(String),

    /// Serialization failed.
    #[error("Failed to write catalog: {0}")]
    Write(#[source] std::io::Error),

    /// Validation found more than one problem.
    #[error("Catalog validation failed:\n{}", format_errors(.0))]
    Invalid(Vec<CatalogError>),
}

impl CatalogError {
    pub(crate) fn schema(context: Option<&str>, message: impl Into<String>) -> Self {
        Self::SchemaViolation { context: context.map(str::to_string), message: message.into() }
    }

    /// Flattens `Invalid` into its individual errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<Self> {
        match self {
            Self::Invalid(errors) => errors,
            other => vec![other],
        }
    }
}

fn format_context(context: Option<&str>) -> String {
    context.map_or_else(String::new, |name| format!(" in context '{name}'"))
}

fn format_errors(errors: &[CatalogError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {err}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
