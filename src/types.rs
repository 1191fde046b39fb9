//! Core types used throughout the project.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A line reference from a `location` element.
///
/// Qt tooling writes either absolute line numbers (`line="42"`) or numbers
/// relative to the previous reference to the same file (`line="+3"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineRef {
    Absolute(u32),
    Relative(i64),
}

/// Error returned when a `line` attribute is not a line reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid line reference '{0}'")]
pub struct InvalidLineRef(pub String);

impl FromStr for LineRef {
    type Err = InvalidLineRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('+') || trimmed.starts_with('-') {
            return trimmed
                .parse::<i64>()
                .map(Self::Relative)
                .map_err(|_| InvalidLineRef(s.to_string()));
        }
        trimmed.parse::<u32>().map(Self::Absolute).map_err(|_| InvalidLineRef(s.to_string()))
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(line) => write!(f, "{line}"),
            Self::Relative(delta) => write!(f, "{delta:+}"),
        }
    }
}

/// Where a message was found in the application sources.
///
/// Advisory only: translator tooling uses it to re-find the call site, and
/// nothing in lookup or validation depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub filename: Option<String>,
    pub line: Option<LineRef>,
}

impl SourceLocation {
    #[must_use]
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self { filename: Some(filename.into()), line: Some(LineRef::Absolute(line)) }
    }

    /// Resolves relative line numbers against the last absolute line seen
    /// for the same file.
    ///
    /// Returns `None` when the line is relative and there is nothing to
    /// resolve against, or when the result would be negative.
    #[must_use]
    pub fn resolve_line(&self, previous: Option<u32>) -> Option<u32> {
        match self.line? {
            LineRef::Absolute(line) => Some(line),
            LineRef::Relative(delta) => {
                let base = i64::from(previous.unwrap_or(0));
                u32::try_from(base + delta).ok()
            }
        }
    }
}

/// Expands the shorthand Qt tooling writes for locations: a missing
/// `filename` repeats the previous one, and a relative `line` counts from the
/// previous line seen in that file.
///
/// Locations must be fed in document order.
#[derive(Debug, Default)]
pub struct LocationResolver {
    filename: Option<String>,
    lines: HashMap<String, u32>,
}

impl LocationResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `location` with its filename filled in and its line absolute.
    pub fn resolve(&mut self, location: &SourceLocation) -> SourceLocation {
        if let Some(filename) = &location.filename {
            self.filename = Some(filename.clone());
        }
        let filename = self.filename.clone();
        let previous = filename.as_ref().and_then(|name| self.lines.get(name).copied());
        let line = location.resolve_line(previous);
        if let (Some(name), Some(line)) = (&filename, line) {
            self.lines.insert(name.clone(), line);
        }
        SourceLocation { filename, line: line.map(LineRef::Absolute) }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filename = self.filename.as_deref().unwrap_or("<unknown>");
        match self.line {
            Some(line) => write!(f, "{filename}:{line}"),
            None => f.write_str(filename),
        }
    }
}
