//! Merging a fresh extraction into an existing catalog.
//!
//! The extraction decides which messages exist and where they come from; the
//! existing catalog contributes what translators wrote.

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::{
    Catalog,
    CatalogError,
    Context,
    Message,
    Translation,
    TranslationBody,
    TranslationState,
};
use crate::config::{
    LocationsMode,
    MergeConfig,
};
use crate::plural::rule_for_language;

/// Counts of what happened to each message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Present in both; translation kept.
    pub matched: usize,
    /// New in the extraction.
    pub added: usize,
    /// Gone from the extraction but kept as vanished or obsolete.
    pub vanished: usize,
    /// Gone from the extraction and removed.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub catalog: Catalog,
    pub report: MergeReport,
}

/// Merges `extracted` into `existing`.
///
/// The result uses the language of `existing` when it has one, otherwise the
/// language of `extracted`.
///
/// # Errors
/// Returns `UnsupportedLanguage` when plural messages need a rule the
/// language does not have.
pub fn merge(
    existing: &Catalog,
    extracted: &Catalog,
    config: &MergeConfig,
) -> Result<MergeOutcome, CatalogError> {
    let language = existing.language.clone().or_else(|| extracted.language.clone());
    let form_count = plural_form_count(language.as_deref(), extracted)?;

    let mut report = MergeReport::default();
    let mut catalog = Catalog {
        version: existing.version.clone(),
        language,
        source_language: extracted
            .source_language
            .clone()
            .or_else(|| existing.source_language.clone()),
        contexts: Vec::with_capacity(extracted.contexts.len()),
    };

    for fresh in &extracted.contexts {
        let old = existing.context(&fresh.name);
        let mut context = Context::new(fresh.name.clone());
        let mut used = HashSet::new();

        for message in &fresh.messages {
            let previous = old.and_then(|c| find_previous(c, &message.source, &used));
            let merged = match previous {
                Some((index, previous)) => {
                    used.insert(index);
                    report.matched += 1;
                    merge_message(message, previous, form_count)
                }
                None => {
                    report.added += 1;
                    Message {
                        translation: Translation::unfinished_empty(message.plural, form_count),
                        translator_comment: None,
                        ..message.clone()
                    }
                }
            };
            context.messages.push(merged);
        }

        if let Some(old) = old {
            for (index, message) in old.messages.iter().enumerate() {
                if !used.contains(&index) {
                    retire(message, config, &mut context, &mut report);
                }
            }
        }
        catalog.contexts.push(context);
    }

    let extracted_names: HashSet<&str> =
        extracted.contexts.iter().map(|c| c.name.as_str()).collect();
    for old in existing.contexts.iter().filter(|c| !extracted_names.contains(c.name.as_str())) {
        let mut context = Context::new(old.name.clone());
        for message in &old.messages {
            retire(message, config, &mut context, &mut report);
        }
        if !context.messages.is_empty() {
            catalog.contexts.push(context);
        }
    }

    if config.locations == LocationsMode::None {
        catalog.strip_locations();
    }

    tracing::info!(
        matched = report.matched,
        added = report.added,
        vanished = report.vanished,
        dropped = report.dropped,
        "Merged catalog"
    );
    Ok(MergeOutcome { catalog, report })
}

/// Number of variants plural messages need, or 0 when there are none.
fn plural_form_count(language: Option<&str>, extracted: &Catalog) -> Result<usize, CatalogError> {
    if !extracted.messages().any(|(_, m)| m.plural) {
        return Ok(0);
    }
    let language = language.unwrap_or_default();
    rule_for_language(language)
        .map(|rule| rule.category_count())
        .ok_or_else(|| CatalogError::UnsupportedLanguage(language.to_string()))
}

/// Finds the unused previous entry for `source`, preferring a live one.
fn find_previous<'a>(
    context: &'a Context,
    source: &str,
    used: &HashSet<usize>,
) -> Option<(usize, &'a Message)> {
    let mut candidates = context
        .messages
        .iter()
        .enumerate()
        .filter(|(index, m)| m.source == source && !used.contains(index));
    let first = candidates.next()?;
    if !first.1.translation.state.is_retired() {
        return Some(first);
    }
    candidates.find(|(_, m)| !m.translation.state.is_retired()).or(Some(first))
}

fn merge_message(fresh: &Message, previous: &Message, form_count: usize) -> Message {
    let mut translation = previous.translation.clone();
    if translation.state.is_retired() {
        translation.state = if translation.body.is_empty() {
            TranslationState::Unfinished
        } else {
            TranslationState::Finished
        };
    }
    if previous.plural != fresh.plural
        || (fresh.plural && translation.body.form_count() != form_count)
    {
        translation.body = reshape(translation.body, fresh.plural, form_count);
        translation.state = TranslationState::Unfinished;
    }

    Message {
        translation,
        translator_comment: previous.translator_comment.clone(),
        ..fresh.clone()
    }
}

/// Converts a body to the shape the plural flag requires.
///
/// Text becomes the first form; the first form becomes the text. Forms are
/// padded with empty strings or truncated to `form_count`.
fn reshape(body: TranslationBody, plural: bool, form_count: usize) -> TranslationBody {
    match (body, plural) {
        (TranslationBody::Text(text), true) => {
            let mut forms = vec![text];
            forms.resize(form_count, String::new());
            TranslationBody::Forms(forms)
        }
        (TranslationBody::Forms(mut forms), true) => {
            forms.resize(form_count, String::new());
            TranslationBody::Forms(forms)
        }
        (TranslationBody::Forms(forms), false) => {
            TranslationBody::Text(forms.into_iter().next().unwrap_or_default())
        }
        (body @ TranslationBody::Text(_), false) => body,
    }
}

/// Handles a message that is no longer extracted.
fn retire(message: &Message, config: &MergeConfig, context: &mut Context, report: &mut MergeReport) {
    if !config.keep_obsolete || message.translation.body.is_empty() {
        report.dropped += 1;
        return;
    }
    let mut retired = message.clone();
    if retired.translation.state != TranslationState::Obsolete {
        retired.translation.state = TranslationState::Vanished;
    }
    report.vanished += 1;
    context.messages.push(retired);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::SourceLocation;

    fn extracted(messages: Vec<Message>) -> Catalog {
        let mut catalog = Catalog { language: None, ..Catalog::default() };
        catalog.context_or_insert("VBoxGlobal").messages = messages;
        catalog
    }

    fn fresh(source: &str, line: u32) -> Message {
        Message {
            translation: Translation::unfinished_empty(false, 0),
            ..Message::new(source, "")
        }
        .with_location(SourceLocation::new("../src/globals/VBoxGlobal.cpp", line))
    }

    fn fresh_plural(source: &str) -> Message {
        Message { plural: true, translation: Translation::unfinished_empty(true, 2), ..fresh(source, 1) }
    }

    #[test]
    fn test_matched_message_keeps_translation() {
        let mut existing = Catalog::new("en");
        let mut old = Message::plural("%n year(s)", ["%n year", "%n years"])
            .with_location(SourceLocation::new("../src/globals/VBoxGlobal.cpp", 10));
        old.translator_comment = Some("checked".to_string());
        existing.context_or_insert("VBoxGlobal").messages.push(old);

        let outcome =
            merge(&existing, &extracted(vec![fresh_plural("%n year(s)")]), &MergeConfig::default())
                .unwrap();

        let message = outcome.catalog.message("VBoxGlobal", "%n year(s)").unwrap();
        assert_eq!(
            message.translation,
            Translation::finished(TranslationBody::Forms(vec![
                "%n year".to_string(),
                "%n years".to_string()
            ]))
        );
        assert_eq!(message.translator_comment.as_deref(), Some("checked"));
        assert_eq!(message.locations[0].line.map(|l| l.to_string()), Some("1".to_string()));
        assert_eq!(outcome.report, MergeReport { matched: 1, ..MergeReport::default() });
    }

    #[googletest::test]
    fn test_new_message_is_unfinished() {
        let existing = Catalog::new("en");

        let outcome = merge(
            &existing,
            &extracted(vec![fresh("Name", 3), fresh_plural("%n day(s)")]),
            &MergeConfig::default(),
        )
        .unwrap();

        let name = outcome.catalog.message("VBoxGlobal", "Name").unwrap();
        expect_that!(name.translation.state, eq(TranslationState::Unfinished));
        let days = outcome.catalog.message("VBoxGlobal", "%n day(s)").unwrap();
        expect_that!(days.translation.body.form_count(), eq(2));
        expect_that!(outcome.report.added, eq(2));
        expect_that!(outcome.catalog.language.as_deref(), some(eq("en")));
    }

    #[googletest::test]
    fn test_missing_messages_vanish_or_drop() {
        let mut existing = Catalog::new("en");
        let context = existing.context_or_insert("VBoxGlobal");
        context.messages.push(Message::new("Kept", "Kept"));
        context.messages.push(Message::new("Translated", "Übersetzt"));
        context.messages.push(Message::new("Untranslated", "").with_state(TranslationState::Unfinished));
        context.messages.push(Message::new("Ancient", "Alt").with_state(TranslationState::Obsolete));

        let outcome =
            merge(&existing, &extracted(vec![fresh("Kept", 1)]), &MergeConfig::default()).unwrap();

        let states: Vec<(&str, TranslationState)> = outcome.catalog.contexts[0]
            .messages
            .iter()
            .map(|m| (m.source.as_str(), m.translation.state))
            .collect();
        expect_that!(
            states,
            elements_are![
                eq(&("Kept", TranslationState::Finished)),
                eq(&("Translated", TranslationState::Vanished)),
                eq(&("Ancient", TranslationState::Obsolete))
            ]
        );
        expect_that!(
            outcome.report,
            eq(MergeReport { matched: 1, added: 0, vanished: 2, dropped: 1 })
        );
    }

    #[googletest::test]
    fn test_keep_obsolete_false_drops_everything_missing() {
        let mut existing = Catalog::new("en");
        existing.context_or_insert("VBoxGlobal").messages.push(Message::new("Gone", "Weg"));
        existing.context_or_insert("OldDialog").messages.push(Message::new("Close", "Schließen"));
        let config = MergeConfig { keep_obsolete: false, ..MergeConfig::default() };

        let outcome = merge(&existing, &extracted(vec![fresh("New", 1)]), &config).unwrap();

        expect_that!(outcome.catalog.contexts.len(), eq(1));
        expect_that!(outcome.catalog.message_count(), eq(1));
        expect_that!(outcome.report.dropped, eq(2));
    }

    #[test]
    fn test_context_order_follows_extraction() {
        let mut existing = Catalog::new("en");
        existing.context_or_insert("Legacy").messages.push(Message::new("Old", "Alt"));
        existing.context_or_insert("VBoxGlobal").messages.push(Message::new("Name", "Name"));
        let mut fresh_catalog = extracted(vec![fresh("Name", 1)]);
        fresh_catalog.context_or_insert("UIMessageCenter").messages.push(fresh("Close", 2));

        let outcome = merge(&existing, &fresh_catalog, &MergeConfig::default()).unwrap();

        let names: Vec<&str> = outcome.catalog.contexts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["VBoxGlobal", "UIMessageCenter", "Legacy"]);
        assert_eq!(
            outcome.catalog.message("Legacy", "Old").map(|m| m.translation.state),
            Some(TranslationState::Vanished)
        );
    }

    #[test]
    fn test_plural_flag_change_reshapes() {
        let mut existing = Catalog::new("en");
        let context = existing.context_or_insert("VBoxGlobal");
        context.messages.push(Message::new("%n year(s)", "%n Jahre"));
        context.messages.push(Message::plural("Item", ["Ein Element", "Elemente"]));

        let outcome = merge(
            &existing,
            &extracted(vec![fresh_plural("%n year(s)"), fresh("Item", 2)]),
            &MergeConfig::default(),
        )
        .unwrap();

        let years = outcome.catalog.message("VBoxGlobal", "%n year(s)").unwrap();
        assert_eq!(
            years.translation,
            Translation {
                state: TranslationState::Unfinished,
                body: TranslationBody::Forms(vec!["%n Jahre".to_string(), String::new()]),
            }
        );
        let item = outcome.catalog.message("VBoxGlobal", "Item").unwrap();
        assert_eq!(
            item.translation,
            Translation {
                state: TranslationState::Unfinished,
                body: TranslationBody::Text("Ein Element".to_string()),
            }
        );
        assert!(crate::validate::check(&outcome.catalog).is_empty());
    }

    #[test]
    fn test_returning_vanished_message_is_revived() {
        let mut existing = Catalog::new("en");
        existing
            .context_or_insert("VBoxGlobal")
            .messages
            .push(Message::new("Back", "Zurück").with_state(TranslationState::Vanished));

        let outcome =
            merge(&existing, &extracted(vec![fresh("Back", 1)]), &MergeConfig::default()).unwrap();

        let message = outcome.catalog.message("VBoxGlobal", "Back").unwrap();
        assert_eq!(message.translation.state, TranslationState::Finished);
        assert_eq!(outcome.report.matched, 1);
    }

    #[test]
    fn test_locations_none_strips() {
        let existing = Catalog::new("en");
        let config = MergeConfig { locations: LocationsMode::None, ..MergeConfig::default() };

        let outcome = merge(&existing, &extracted(vec![fresh("Name", 7)]), &config).unwrap();

        assert!(outcome.catalog.messages().all(|(_, m)| m.locations.is_empty()));
    }

    #[test]
    fn test_unsupported_language_with_plurals() {
        let existing = Catalog::new("de");

        let result =
            merge(&existing, &extracted(vec![fresh_plural("%n year(s)")]), &MergeConfig::default());

        assert!(matches!(result, Err(CatalogError::UnsupportedLanguage(lang)) if lang == "de"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut existing = Catalog::new("en");
        existing.context_or_insert("VBoxGlobal").messages.push(Message::new("Name", "Name"));
        let fresh_catalog = extracted(vec![fresh("Name", 1), fresh("Other", 2)]);

        let once = merge(&existing, &fresh_catalog, &MergeConfig::default()).unwrap();
        let twice = merge(&once.catalog, &fresh_catalog, &MergeConfig::default()).unwrap();

        assert_eq!(twice.catalog, once.catalog);
        assert_eq!(twice.report, MergeReport { matched: 2, ..MergeReport::default() });
    }
}
