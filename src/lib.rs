//! ts-catalog
//!
//! Reader, writer and runtime lookup for Qt Linguist TS translation catalogs.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod lookup;
pub mod merge;
pub mod placeholder;
pub mod plural;
pub mod types;
pub mod validate;
pub mod workspace;

mod test_utils;

pub use catalog::{
    Catalog,
    CatalogError,
};
pub use lookup::Translator;
