//! Runtime lookup of translations.
//!
//! A [`Translator`] is built once from a validated catalog and is read-only
//! afterwards, so it can be shared freely between threads.

use std::collections::HashMap;

use crate::catalog::{
    Catalog,
    CatalogError,
    Message,
    TranslationBody,
    TranslationState,
};
use crate::config::LookupConfig;
use crate::placeholder;
use crate::plural::{
    PluralRule,
    rule_for_language,
};

/// Immutable index over one catalog.
#[derive(Debug, Clone)]
pub struct Translator {
    /// Target language of the catalog.
    language: Option<String>,
    /// Rule used for plural messages; `None` when the catalog has none.
    rule: Option<&'static PluralRule>,
    /// Usable messages keyed by (context, source).
    entries: HashMap<(String, String), Message>,
}

impl Translator {
    /// Validates the catalog and indexes its usable messages.
    ///
    /// Vanished and obsolete messages are left out, as are unfinished ones
    /// when `config.include_unfinished` is false.
    ///
    /// # Errors
    /// Returns the validation error(s) of the catalog.
    pub fn from_catalog(catalog: Catalog, config: &LookupConfig) -> Result<Self, CatalogError> {
        crate::validate::ensure_valid(&catalog)?;

        let rule = catalog.language.as_deref().and_then(rule_for_language);
        let mut entries = HashMap::with_capacity(catalog.message_count());
        for context in catalog.contexts {
            for message in context.messages {
                let usable = match message.translation.state {
                    TranslationState::Finished => true,
                    TranslationState::Unfinished => config.include_unfinished,
                    TranslationState::Vanished | TranslationState::Obsolete => false,
                };
                if usable {
                    entries.insert((context.name.clone(), message.source.clone()), message);
                }
            }
        }

        tracing::debug!(
            language = catalog.language.as_deref().unwrap_or_default(),
            entries = entries.len(),
            "Built translator"
        );
        Ok(Self { language: catalog.language, rule, entries })
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Number of messages available for lookup.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the raw template selected for `count`, before substitution.
    ///
    /// `None` when the message is unknown, not usable, or the selected text is
    /// empty.
    #[must_use]
    pub fn lookup(&self, context: &str, source: &str, count: Option<u64>) -> Option<&str> {
        let message = self.entries.get(&(context.to_string(), source.to_string()))?;
        let text = match &message.translation.body {
            TranslationBody::Text(text) => text.as_str(),
            TranslationBody::Forms(forms) => {
                let rule = self.rule?;
                let index = count.map_or_else(|| rule.other_index(), |n| rule.form_index(n));
                forms.get(index)?.as_str()
            }
        };
        (!text.is_empty()).then_some(text)
    }

    /// Translates and substitutes `%n`, falling back to the source text.
    #[must_use]
    pub fn translate(&self, context: &str, source: &str, count: Option<u64>) -> String {
        self.translate_with_args(context, source, count, &[])
    }

    /// Translates and substitutes `%n` and `%1`..`%99`, falling back to the
    /// source text.
    ///
    /// # Examples
    /// ```
    /// use ts_catalog::catalog::parse_catalog;
    /// use ts_catalog::config::LookupConfig;
    /// use ts_catalog::lookup::Translator;
    ///
    /// let catalog = parse_catalog(
    ///     r#"<TS version="2.1" language="en"><context><name>VBoxGlobal</name>
    ///     <message numerus="yes"><source>%n year(s)</source><translation>
    ///     <numerusform>%n year</numerusform><numerusform>%n years</numerusform>
    ///     </translation></message></context></TS>"#,
    /// )
    /// .unwrap();
    /// let translator = Translator::from_catalog(catalog, &LookupConfig::default()).unwrap();
    ///
    /// assert_eq!(translator.translate("VBoxGlobal", "%n year(s)", Some(1)), "1 year");
    /// assert_eq!(translator.translate("VBoxGlobal", "%n year(s)", Some(5)), "5 years");
    /// ```
    #[must_use]
    pub fn translate_with_args(
        &self,
        context: &str,
        source: &str,
        count: Option<u64>,
        args: &[&str],
    ) -> String {
        let template = self.lookup(context, source, count).unwrap_or_else(|| {
            tracing::trace!(context, source, "No usable translation, using source text");
            source
        });
        placeholder::render(template, count, args)
    }
}
