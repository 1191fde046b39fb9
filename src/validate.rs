//! Conformance checks that make a catalog fatal to load.

use std::collections::HashSet;

use crate::catalog::{
    Catalog,
    CatalogError,
    Context,
    TranslationBody,
};
use crate::plural::{
    PluralRule,
    rule_for_language,
};

/// Outcome of resolving the catalog's plural rule.
enum RuleLookup {
    Found(&'static PluralRule),
    MissingLanguage,
    Unsupported(String),
}

fn resolve_rule(catalog: &Catalog) -> RuleLookup {
    match catalog.language.as_deref().map(str::trim) {
        None | Some("") => RuleLookup::MissingLanguage,
        Some(language) => rule_for_language(language)
            .map_or_else(|| RuleLookup::Unsupported(language.to_string()), RuleLookup::Found),
    }
}

/// Returns every conformance problem in the catalog.
///
/// Retired (vanished or obsolete) messages are never looked up, so they are
/// exempt from the uniqueness and plural checks.
#[must_use]
pub fn check(catalog: &Catalog) -> Vec<CatalogError> {
    let mut errors = Vec::new();
    let rule = resolve_rule(catalog);
    let mut rule_reported = false;
    let mut seen_contexts = HashSet::new();

    for context in &catalog.contexts {
        if context.name.is_empty() {
            errors.push(CatalogError::schema(None, "context with an empty name"));
        } else if !seen_contexts.insert(context.name.as_str()) {
            errors.push(CatalogError::schema(Some(&context.name), "duplicate context name"));
        }

        check_duplicate_sources(context, &mut errors);

        for message in context.messages.iter().filter(|m| !m.translation.state.is_retired()) {
            match (&message.translation.body, message.plural) {
                (TranslationBody::Forms(_), false) => {
                    errors.push(CatalogError::schema(
                        Some(&context.name),
                        format!("non-plural message '{}' has plural forms", message.source),
                    ));
                }
                (TranslationBody::Text(_), true) => {
                    errors.push(CatalogError::schema(
                        Some(&context.name),
                        format!("plural message '{}' has a plain-text translation", message.source),
                    ));
                }
                (TranslationBody::Forms(forms), true) => match &rule {
                    RuleLookup::Found(rule) => {
                        if forms.len() != rule.category_count() {
                            errors.push(CatalogError::PluralCountMismatch {
                                context: context.name.clone(),
                                source_text: message.source.clone(),
                                language: catalog.language.clone().unwrap_or_default(),
                                expected: rule.category_count(),
                                found: forms.len(),
                            });
                        }
                    }
                    RuleLookup::MissingLanguage if !rule_reported => {
                        rule_reported = true;
                        errors.push(CatalogError::schema(
                            None,
                            "plural messages require a language attribute on <TS>",
                        ));
                    }
                    RuleLookup::Unsupported(language) if !rule_reported => {
                        rule_reported = true;
                        errors.push(CatalogError::UnsupportedLanguage(language.clone()));
                    }
                    _ => {}
                },
                (TranslationBody::Text(_), false) => {}
            }
        }
    }

    errors
}

fn check_duplicate_sources(context: &Context, errors: &mut Vec<CatalogError>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for message in context.messages.iter().filter(|m| !m.translation.state.is_retired()) {
        if !seen.insert(message.source.as_str()) && reported.insert(message.source.as_str()) {
            errors.push(CatalogError::schema(
                Some(&context.name),
                format!("duplicate source text '{}'", message.source),
            ));
        }
    }
}

/// Fails with the single problem found, or `CatalogError::Invalid` listing
/// all of them.
///
/// # Errors
/// Returns error if [`check`] reports anything.
pub fn ensure_valid(catalog: &Catalog) -> Result<(), CatalogError> {
    let mut errors = check(catalog);
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        count => {
            tracing::debug!(count, "Catalog failed validation");
            Err(CatalogError::Invalid(errors))
        }
    }
}
