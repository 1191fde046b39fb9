//! Plural categories and per-language plural rules.
//!
//! Only English is built in. Other languages must come from an external
//! locale-data source; nothing here guesses their category counts.

use std::fmt;

use serde::Serialize;

/// A plural category a count can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plural rule for one language family.
///
/// `categories` lists the categories in the order their variants appear in a
/// `translation` element.
#[derive(Debug, Clone, Copy)]
pub struct PluralRule {
    /// Primary language subtag the rule applies to.
    pub language: &'static str,
    /// Categories in variant order.
    pub categories: &'static [PluralCategory],
    /// Maps a count to its category.
    select: fn(u64) -> PluralCategory,
}

impl PluralRule {
    /// Number of variants a plural message must carry.
    #[must_use]
    pub const fn category_count(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn category(&self, count: u64) -> PluralCategory {
        (self.select)(count)
    }

    /// Index of the variant to use for `count`.
    ///
    /// Total over all counts: a category missing from `categories` maps to
    /// the last variant, which is always `other`.
    #[must_use]
    pub fn form_index(&self, count: u64) -> usize {
        let category = self.category(count);
        self.categories
            .iter()
            .position(|c| *c == category)
            .unwrap_or_else(|| self.categories.len().saturating_sub(1))
    }

    /// Index of the `other` variant, used when no count is supplied.
    #[must_use]
    pub fn other_index(&self) -> usize {
        self.categories
            .iter()
            .position(|c| *c == PluralCategory::Other)
            .unwrap_or_else(|| self.categories.len().saturating_sub(1))
    }
}

/// English: `one` for exactly 1, `other` for everything else including 0.
const fn select_english(count: u64) -> PluralCategory {
    if count == 1 { PluralCategory::One } else { PluralCategory::Other }
}

/// Built-in rule table.
pub const PLURAL_RULES: &[PluralRule] = &[PluralRule {
    language: "en",
    categories: &[PluralCategory::One, PluralCategory::Other],
    select: select_english,
}];

/// Returns the primary language subtag, lowercased.
///
/// Accepts both `en_US` (Qt) and `en-US` (BCP 47) spellings.
#[must_use]
pub fn primary_subtag(language: &str) -> String {
    language.split(['_', '-']).next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Looks up the plural rule for a language identifier.
#[must_use]
pub fn rule_for_language(language: &str) -> Option<&'static PluralRule> {
    let primary = primary_subtag(language);
    if primary.is_empty() {
        return None;
    }
    PLURAL_RULES.iter().find(|rule| rule.language == primary)
}
