//! Report views over finished activities
//!
//! The view engine turns a start-ordered slice of [`ClosedActivity`] into one
//! of four plain-text reports:
//!
//! - `summary`: per local day, accumulated duration per group key plus a
//!   `(Total)` line
//! - `detail`: per group key, the individual spans in start order
//! - `dist`: per local day, the timeline of spans with synthetic `<idle>`
//!   records filling gaps inside the working-day window
//! - `efforts`: accumulated duration per group key over the whole range
//!
//! Grouping defaults to the activity title; passing [`tag_key`] groups by
//! tag instead. The engine is stateless, performs no I/O, and never mutates
//! its input. The only failure mode is an unknown view type name.

mod detail;
mod dist;
mod efforts;
mod summary;

pub use dist::IDLE_TITLE;

use crate::error::{Error, Result};
use crate::types::ClosedActivity;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use std::fmt;
use std::str::FromStr;

/// Group-key function applied to every activity before aggregation.
pub type KeyFn = fn(&ClosedActivity) -> String;

/// Default group key: the activity title.
pub fn title_key(activity: &ClosedActivity) -> String {
    activity.title().to_string()
}

/// Group key for by-tag reports: the derived tag of the title.
pub fn tag_key(activity: &ClosedActivity) -> String {
    activity.tag().to_string()
}

/// The closed set of report types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    Summary,
    Detail,
    Dist,
    Efforts,
}

impl ViewType {
    pub const ALL: [ViewType; 4] = [
        ViewType::Summary,
        ViewType::Detail,
        ViewType::Dist,
        ViewType::Efforts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::Summary => "summary",
            ViewType::Detail => "detail",
            ViewType::Dist => "dist",
            ViewType::Efforts => "efforts",
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "summary" => Ok(ViewType::Summary),
            "detail" => Ok(ViewType::Detail),
            "dist" => Ok(ViewType::Dist),
            "efforts" => Ok(ViewType::Efforts),
            other => Err(Error::UnknownViewType(other.to_string())),
        }
    }
}

/// The local working-day window bracketing a day's distribution report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

const fn hm(hour: u32, minute: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(t) => t,
        None => NaiveTime::MIN,
    }
}

impl DayWindow {
    pub const DEFAULT_START: NaiveTime = hm(8, 30);
    pub const DEFAULT_END: NaiveTime = hm(21, 0);

    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// The window anchored to a calendar day, in local time.
    pub fn bounds(&self, day: NaiveDate) -> (DateTime<Local>, DateTime<Local>) {
        (local_datetime(day, self.start), local_datetime(day, self.end))
    }
}

impl Default for DayWindow {
    fn default() -> Self {
        Self {
            start: Self::DEFAULT_START,
            end: Self::DEFAULT_END,
        }
    }
}

/// Resolve a local calendar day plus time of day to a local timestamp.
///
/// Nonexistent wall-clock times (DST spring-forward gap) fall back to
/// interpreting the naive value as UTC.
pub fn local_datetime(day: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = day.and_time(time);
    naive
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// The local calendar day an activity started on.
pub(crate) fn local_day(activity: &ClosedActivity) -> NaiveDate {
    activity.start().with_timezone(&Local).date_naive()
}

/// Render a report over the given activities.
///
/// `view_type` must be one of `summary`, `detail`, `dist`, `efforts`;
/// anything else fails with [`Error::UnknownViewType`] before any output is
/// produced. `key` defaults to grouping by title. The working-day `window`
/// is consulted by the distribution view only.
pub fn render(
    activities: &[ClosedActivity],
    view_type: &str,
    key: Option<KeyFn>,
    window: DayWindow,
) -> Result<String> {
    let view_type: ViewType = view_type.parse()?;
    let key = key.unwrap_or(title_key);

    Ok(match view_type {
        ViewType::Summary => summary::render(activities, key),
        ViewType::Detail => detail::render(activities, key),
        ViewType::Dist => dist::render(activities, key, window, Local::now()),
        ViewType::Efforts => efforts::render(activities, key),
    })
}

/// Format a duration rounded to the nearest minute, half-up.
///
/// Zero units are omitted: `1h`, `45m`, `1h30m`. A duration rounding to
/// nothing prints as `0m`.
pub fn format_duration(d: Duration) -> String {
    let minutes = (d.num_seconds().max(0) + 30) / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);

    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}
