//! Placeholder substitution for translated text.
//!
//! - `%n` is replaced by the count.
//! - `%Ln` is replaced by the count with English digit grouping (`1,234`).
//! - `%1` to `%99` (or the localized `%L1` to `%L99`) are replaced by
//!   positional arguments.
//!
//! Substitution is a single left-to-right pass: text coming from arguments is
//! never scanned again. Tokens without a value are left untouched.

use std::collections::BTreeSet;
use std::fmt::Write;

/// A placeholder token found in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Count,
    LocalizedCount,
    Arg(usize),
}

/// Splits a template into literal text and tokens.
///
/// Returns (byte offset, byte length, token) for every token.
fn tokens(text: &str) -> Vec<(usize, usize, Token)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        if bytes.get(index) != Some(&b'%') {
            index += 1;
            continue;
        }
        let next = bytes.get(index + 1).copied();
        let after = bytes.get(index + 2).copied();
        match (next, after) {
            (Some(b'n'), _) => {
                found.push((index, 2, Token::Count));
                index += 2;
            }
            (Some(b'L'), Some(b'n')) => {
                found.push((index, 3, Token::LocalizedCount));
                index += 3;
            }
            (Some(b'L'), _) => match arg_number(bytes, index + 2) {
                Some((position, digits)) => {
                    found.push((index, 2 + digits, Token::Arg(position)));
                    index += 2 + digits;
                }
                None => index += 1,
            },
            _ => match arg_number(bytes, index + 1) {
                Some((position, digits)) => {
                    found.push((index, 1 + digits, Token::Arg(position)));
                    index += 1 + digits;
                }
                None => index += 1,
            },
        }
    }
    found
}

/// Reads `1`..`99` at `start`, greedily taking a second digit.
///
/// Returns the number and how many digits it used.
fn arg_number(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    let first = match bytes.get(start).copied() {
        Some(digit @ b'1'..=b'9') => usize::from(digit - b'0'),
        _ => return None,
    };
    match bytes.get(start + 1).copied() {
        Some(digit @ b'0'..=b'9') => Some((first * 10 + usize::from(digit - b'0'), 2)),
        _ => Some((first, 1)),
    }
}

/// Formats a count with `,` between groups of three digits.
///
/// # Examples
/// ```
/// use ts_catalog::placeholder::group_digits;
///
/// assert_eq!(group_digits(1_234_567), "1,234,567");
/// assert_eq!(group_digits(999), "999");
/// ```
#[must_use]
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Substitutes the count and positional arguments into a template.
///
/// # Examples
/// ```
/// use ts_catalog::placeholder::render;
///
/// assert_eq!(render("%n years", Some(5), &[]), "5 years");
/// assert_eq!(render("Machine <b>%1</b>", None, &["Win10"]), "Machine <b>Win10</b>");
/// ```
#[must_use]
pub fn render(template: &str, count: Option<u64>, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for (offset, len, token) in tokens(template) {
        out.push_str(template.get(last..offset).unwrap_or_default());
        let original = template.get(offset..offset + len).unwrap_or_default();
        match (token, count) {
            (Token::Count, Some(count)) => {
                let _ = write!(out, "{count}");
            }
            (Token::LocalizedCount, Some(count)) => out.push_str(&group_digits(count)),
            (Token::Arg(position), _) => {
                match position.checked_sub(1).and_then(|index| args.get(index)) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(original),
                }
            }
            (Token::Count | Token::LocalizedCount, None) => out.push_str(original),
        }
        last = offset + len;
    }
    out.push_str(template.get(last..).unwrap_or_default());
    out
}

/// Placeholders used by a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    /// `%n` or `%Ln` occurs.
    pub count: bool,
    /// Positional argument numbers (1-based).
    pub positional: BTreeSet<usize>,
}

/// Lists the placeholders a template uses.
#[must_use]
pub fn scan(template: &str) -> Placeholders {
    let mut placeholders = Placeholders::default();
    for (_, _, token) in tokens(template) {
        match token {
            Token::Count | Token::LocalizedCount => placeholders.count = true,
            Token::Arg(position) => {
                placeholders.positional.insert(position);
            }
        }
    }
    placeholders
}
