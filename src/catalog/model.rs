//! In-memory representation of a TS catalog.
//!
//! Order is significant everywhere: contexts keep file order, messages keep
//! their order within a context and plural variants keep their ordinal
//! positions.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::types::SourceLocation;

/// Default value of the root `version` attribute.
pub const DEFAULT_FORMAT_VERSION: &str = "2.1";

/// A whole TS document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Format version from the root element (e.g. "2.1").
    pub version: String,
    /// Target language, e.g. "en" or "en_US".
    pub language: Option<String>,
    pub source_language: Option<String>,
    pub contexts: Vec<Context>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            version: DEFAULT_FORMAT_VERSION.to_string(),
            language: None,
            source_language: None,
            contexts: Vec::new(),
        }
    }
}

impl Catalog {
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self { language: Some(language.into()), ..Self::default() }
    }

    #[must_use]
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Returns the context with this name, appending an empty one if needed.
    pub fn context_or_insert(&mut self, name: &str) -> &mut Context {
        let index = match self.contexts.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.contexts.push(Context::new(name));
                self.contexts.len() - 1
            }
        };
        // The index is either an existing position or the element just pushed.
        #[allow(clippy::indexing_slicing)]
        &mut self.contexts[index]
    }

    /// Finds a message by context name and source text.
    #[must_use]
    pub fn message(&self, context: &str, source: &str) -> Option<&Message> {
        self.context(context)?.message(source)
    }

    /// Iterates over every message with its context name.
    pub fn messages(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.contexts
            .iter()
            .flat_map(|context| context.messages.iter().map(move |m| (context.name.as_str(), m)))
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|c| c.messages.len()).sum()
    }

    /// Removes all advisory location metadata.
    pub fn strip_locations(&mut self) {
        for context in &mut self.contexts {
            for message in &mut context.messages {
                message.locations.clear();
            }
        }
    }
}

/// A named group of messages, usually one UI component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub name: String,
    pub messages: Vec<Message>,
}

impl Context {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), messages: Vec::new() }
    }

    /// First live message with this source text, or any message when all
    /// matches are retired.
    #[must_use]
    pub fn message(&self, source: &str) -> Option<&Message> {
        let mut matches = self.messages.iter().filter(|m| m.source == source);
        let first = matches.next()?;
        if !first.translation.state.is_retired() {
            return Some(first);
        }
        matches.find(|m| !m.translation.state.is_retired()).or(Some(first))
    }
}

/// One translatable string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub id: Option<String>,
    /// `numerus="yes"`: the translation is a list of plural variants.
    pub plural: bool,
    pub locations: Vec<SourceLocation>,
    /// Lookup key, verbatim (markup and placeholders included).
    pub source: String,
    pub old_source: Option<String>,
    /// Disambiguation comment.
    pub comment: Option<String>,
    pub old_comment: Option<String>,
    pub extra_comment: Option<String>,
    pub translator_comment: Option<String>,
    pub translation: Translation,
    /// `extra-*` elements, kept as (element name, text).
    pub extras: Vec<(String, String)>,
}

impl Message {
    /// A message with a finished, non-plural translation.
    #[must_use]
    pub fn new(source: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translation: Translation::finished(TranslationBody::Text(translation.into())),
            ..Self::default()
        }
    }

    /// A message with finished plural variants in category order.
    #[must_use]
    pub fn plural<I, S>(source: impl Into<String>, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            plural: true,
            source: source.into(),
            translation: Translation::finished(TranslationBody::Forms(
                forms.into_iter().map(Into::into).collect(),
            )),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub const fn with_state(mut self, state: TranslationState) -> Self {
        self.translation.state = state;
        self
    }
}

/// Translation status, from the `type` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationState {
    /// No `type` attribute.
    #[default]
    Finished,
    Unfinished,
    /// Source string disappeared from the application (newer tooling).
    Vanished,
    /// Source string disappeared from the application (older tooling).
    Obsolete,
}

impl TranslationState {
    /// Value of the `type` attribute, `None` for finished translations.
    #[must_use]
    pub const fn attribute(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Vanished => Some("vanished"),
            Self::Obsolete => Some("obsolete"),
        }
    }

    /// Vanished and obsolete entries are kept for translators but never used.
    #[must_use]
    pub const fn is_retired(self) -> bool {
        matches!(self, Self::Vanished | Self::Obsolete)
    }
}

impl FromStr for TranslationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfinished" => Ok(Self::Unfinished),
            "vanished" => Ok(Self::Vanished),
            "obsolete" => Ok(Self::Obsolete),
            "finished" | "" => Ok(Self::Finished),
            other => Err(format!("unknown translation type '{other}'")),
        }
    }
}

impl fmt::Display for TranslationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute().unwrap_or("finished"))
    }
}

/// Content of a `translation` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationBody {
    /// Plain text for non-plural messages.
    Text(String),
    /// Ordered plural variants; index 0 is the first category of the language.
    Forms(Vec<String>),
}

impl Default for TranslationBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl TranslationBody {
    /// True when there is no text at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Forms(forms) => forms.iter().all(String::is_empty),
        }
    }

    #[must_use]
    pub fn form_count(&self) -> usize {
        match self {
            Self::Text(_) => 0,
            Self::Forms(forms) => forms.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub state: TranslationState,
    pub body: TranslationBody,
}

impl Translation {
    #[must_use]
    pub const fn finished(body: TranslationBody) -> Self {
        Self { state: TranslationState::Finished, body }
    }

    /// Empty unfinished translation; plural messages get `forms` empty variants.
    #[must_use]
    pub fn unfinished_empty(plural: bool, forms: usize) -> Self {
        let body = if plural {
            TranslationBody::Forms(vec![String::new(); forms])
        } else {
            TranslationBody::Text(String::new())
        };
        Self { state: TranslationState::Unfinished, body }
    }
}
