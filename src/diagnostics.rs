//! Non-fatal findings about a catalog.
//!
//! Unlike [`crate::validate`], nothing here stops a catalog from loading. Each
//! kind is reported with the severity configured for it, or not at all.

use serde::Serialize;

use crate::catalog::{
    Catalog,
    Message,
    TranslationBody,
    TranslationState,
};
use crate::config::{
    DiagnosticsConfig,
    Severity,
};
use crate::placeholder;
use crate::plural::{
    PluralCategory,
    rule_for_language,
};
use crate::types::{
    LocationResolver,
    SourceLocation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    Unfinished,
    PlaceholderMismatch,
    EmptyTranslation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub context: String,
    /// Source text of the message.
    pub source: String,
    pub message: String,
    /// First location of the message, resolved to an absolute line.
    pub location: Option<SourceLocation>,
}

/// Runs every enabled check over the live messages of `catalog`.
#[must_use]
pub fn generate_diagnostics(catalog: &Catalog, config: &DiagnosticsConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let rule = catalog.language.as_deref().and_then(rule_for_language);
    let mut resolver = LocationResolver::new();

    for (context, message) in catalog.messages() {
        // Every location feeds the resolver, including those of skipped messages.
        let locations: Vec<SourceLocation> =
            message.locations.iter().map(|location| resolver.resolve(location)).collect();
        if message.translation.state.is_retired() {
            continue;
        }
        let mut push = |kind: DiagnosticKind, severity: Severity, text: String| {
            if severity != Severity::Off {
                diagnostics.push(Diagnostic {
                    kind,
                    severity,
                    context: context.to_string(),
                    source: message.source.clone(),
                    message: text,
                    location: locations.first().cloned(),
                });
            }
        };

        match message.translation.state {
            TranslationState::Unfinished => push(
                DiagnosticKind::Unfinished,
                config.unfinished,
                format!("Translation of '{}' is unfinished", message.source),
            ),
            TranslationState::Finished => {
                if let Some(text) = empty_translation(message) {
                    push(DiagnosticKind::EmptyTranslation, config.empty_translation, text);
                }
            }
            TranslationState::Vanished | TranslationState::Obsolete => {}
        }

        let may_omit_count = |index: usize| {
            rule.and_then(|r| r.categories.get(index)) == Some(&PluralCategory::One)
        };
        for text in placeholder_mismatches(message, may_omit_count) {
            push(DiagnosticKind::PlaceholderMismatch, config.placeholder_mismatch, text);
        }
    }

    tracing::debug!(count = diagnostics.len(), "Generated diagnostics");
    diagnostics
}

fn empty_translation(message: &Message) -> Option<String> {
    match &message.translation.body {
        TranslationBody::Text(text) if text.is_empty() => {
            Some(format!("Finished translation of '{}' is empty", message.source))
        }
        TranslationBody::Forms(forms) => {
            let empty: Vec<String> = forms
                .iter()
                .enumerate()
                .filter(|(_, form)| form.is_empty())
                .map(|(index, _)| index.to_string())
                .collect();
            (!empty.is_empty()).then(|| {
                format!(
                    "Finished translation of '{}' has empty plural forms: {}",
                    message.source,
                    empty.join(", ")
                )
            })
        }
        TranslationBody::Text(_) => None,
    }
}

/// Compares the placeholders of every non-empty variant with the source.
///
/// `%n` is only checked for plural messages; `may_omit_count(index)` says
/// whether the variant at `index` may leave it out.
fn placeholder_mismatches(message: &Message, may_omit_count: impl Fn(usize) -> bool) -> Vec<String> {
    let expected = placeholder::scan(&message.source);
    let variants: Vec<(Option<usize>, &str)> = match &message.translation.body {
        TranslationBody::Text(text) => vec![(None, text.as_str())],
        TranslationBody::Forms(forms) => {
            forms.iter().enumerate().map(|(i, f)| (Some(i), f.as_str())).collect()
        }
    };

    let mut problems = Vec::new();
    for (index, text) in variants {
        if text.is_empty() {
            continue;
        }
        let found = placeholder::scan(text);
        let label = index.map_or_else(|| "Translation".to_string(), |i| format!("Plural form {i}"));

        let missing: Vec<String> =
            expected.positional.difference(&found.positional).map(|k| format!("%{k}")).collect();
        if !missing.is_empty() {
            problems.push(format!(
                "{label} of '{}' is missing {}",
                message.source,
                missing.join(", ")
            ));
        }

        let extra: Vec<String> =
            found.positional.difference(&expected.positional).map(|k| format!("%{k}")).collect();
        if !extra.is_empty() {
            problems.push(format!(
                "{label} of '{}' uses {} which the source does not",
                message.source,
                extra.join(", ")
            ));
        }

        if let Some(index) = index
            && message.plural
            && expected.count
            && !found.count
            && !may_omit_count(index)
        {
            problems.push(format!("{label} of '{}' is missing %n", message.source));
        }
    }
    problems
}
