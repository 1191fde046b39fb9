//! TS catalog model, reader and writer.

/// Error taxonomy
mod error;
/// Data model
pub mod model;
/// XML parsing
mod reader;
/// XML serialization
mod writer;

use std::path::Path;

pub use error::CatalogError;
pub use model::{
    Catalog,
    Context,
    Message,
    Translation,
    TranslationBody,
    TranslationState,
};
pub use reader::parse_catalog;
pub use writer::write_catalog;

/// Reads and parses a TS file without validating it.
///
/// # Errors
/// Returns error if the file cannot be read or is not a well-formed TS document.
pub fn read_catalog_file(path: &Path) -> Result<Catalog, CatalogError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
    parse_catalog(&content)
}

/// Reads, parses and validates a TS file.
///
/// # Errors
/// Returns error if reading, parsing or validation fails.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    tracing::debug!(path = %path.display(), "Loading catalog");
    let catalog = read_catalog_file(path)?;
    crate::validate::ensure_valid(&catalog)?;
    Ok(catalog)
}

/// Serializes a catalog and writes it to `path`.
///
/// # Errors
/// Returns error if serialization or the write fails.
pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<(), CatalogError> {
    let xml = write_catalog(catalog)?;
    std::fs::write(path, xml)
        .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
    tracing::debug!(path = %path.display(), "Saved catalog");
    Ok(())
}
