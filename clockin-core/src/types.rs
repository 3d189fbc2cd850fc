//! Core domain types for clockin
//!
//! An *activity* is a titled span of time with free-form notes. It is "open"
//! from the moment it is started until it is finished, at which point it
//! becomes a [`ClosedActivity`] and is never modified again.
//!
//! A title may carry a *tag* prefix separated by `": "`, e.g.
//! `"book: Clean Code"` has the tag `"book"`. Tags are derived on the fly and
//! never stored.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title/tag separator. Everything before the first occurrence is the tag.
pub const TAG_SEPARATOR: &str = ": ";

/// Derive the tag of a title.
///
/// Splits on the first `": "` only; a title without the separator is its own
/// tag.
pub fn tag(title: &str) -> &str {
    match title.split_once(TAG_SEPARATOR) {
        Some((tag, _)) => tag,
        None => title,
    }
}

/// An activity that has been started but not yet finished.
///
/// At most one open activity exists at a time; the store enforces that
/// invariant, not this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenActivity {
    /// Non-empty activity title
    pub title: String,
    /// When the activity started (UTC, second precision)
    pub start: DateTime<Utc>,
    /// Free-form notes, possibly multi-line
    pub notes: String,
}

impl OpenActivity {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, notes: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start,
            notes: notes.into(),
        }
    }

    /// The derived tag of this activity's title.
    pub fn tag(&self) -> &str {
        tag(&self.title)
    }
}

/// A finished activity span. Invariant: `end >= start`.
///
/// Composes an [`OpenActivity`] with the end timestamp rather than repeating
/// its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedActivity {
    #[serde(flatten)]
    pub open: OpenActivity,
    /// When the activity finished (UTC)
    pub end: DateTime<Utc>,
}

impl ClosedActivity {
    pub fn new(open: OpenActivity, end: DateTime<Utc>) -> Self {
        Self { open, end }
    }

    pub fn title(&self) -> &str {
        &self.open.title
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.open.start
    }

    pub fn notes(&self) -> &str {
        &self.open.notes
    }

    /// The derived tag of this activity's title.
    pub fn tag(&self) -> &str {
        tag(&self.open.title)
    }

    /// Duration of the span.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.open.start
    }
}

/// Text form: title, local `start ~ end` line, then notes indented by four
/// spaces with trailing blank lines trimmed.
impl fmt::Display for ClosedActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut notes = String::new();
        for line in self.open.notes.trim_end().split('\n') {
            notes.push_str("    ");
            notes.push_str(line);
            notes.push('\n');
        }

        write!(
            f,
            "{}\n{} ~ {}\n{}",
            self.open.title,
            self.open
                .start
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S"),
            self.end.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            notes.trim_end(),
        )
    }
}

/// Title or tag predicate for range queries.
///
/// `Any` (or an empty value list) matches every activity. A tag filter
/// matches activities whose title starts with `"<tag>: "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    /// No filtering
    Any,
    /// Match activities whose title is in the list
    Titles(Vec<String>),
    /// Match activities whose derived tag is in the list
    Tags(Vec<String>),
}

impl QueryArg {
    pub fn is_empty(&self) -> bool {
        match self {
            QueryArg::Any => true,
            QueryArg::Titles(v) | QueryArg::Tags(v) => v.is_empty(),
        }
    }
}

impl Default for QueryArg {
    fn default() -> Self {
        QueryArg::Any
    }
}
