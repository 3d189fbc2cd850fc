//! Distribution view: per local day, the timeline of spans with synthetic
//! idle records filling the gaps inside the working-day window.

use super::{format_duration, local_day, DayWindow, KeyFn};
use crate::types::ClosedActivity;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Sentinel title of synthetic gap records.
pub const IDLE_TITLE: &str = "<idle>";

/// A rendered timeline record: either a copy of a real activity carrying its
/// group key, or a synthetic idle gap. Input activities are never modified.
#[derive(Debug, Clone)]
struct Span {
    key: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Span {
    fn idle(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            key: IDLE_TITLE.to_string(),
            start,
            end,
        }
    }

    fn is_idle(&self) -> bool {
        self.key == IDLE_TITLE
    }

    fn duration(&self) -> Duration {
        self.end - self.start
    }
}

pub(super) fn render(
    activities: &[ClosedActivity],
    key: KeyFn,
    window: DayWindow,
    now: DateTime<Local>,
) -> String {
    let mut days: BTreeMap<NaiveDate, Vec<Span>> = BTreeMap::new();

    for activity in activities {
        days.entry(local_day(activity)).or_default().push(Span {
            key: key(activity),
            start: activity.start(),
            end: activity.end,
        });
    }

    let now = now.with_timezone(&Utc);
    let mut out = String::new();
    for (day, spans) in days {
        let (day_start, day_end) = window.bounds(day);
        let spans = fill_idles(
            spans,
            day_start.with_timezone(&Utc),
            day_end.with_timezone(&Utc),
            now,
        );

        out.push_str(&format!("{}\n", day.format("%Y-%m-%d")));

        let mut idle_total = Duration::zero();
        for span in &spans {
            if span.is_idle() {
                idle_total = idle_total + span.duration();
            }

            out.push_str(&format!(
                "  {} ~ {} | {:<7} | {}\n",
                span.start.with_timezone(&Local).format("%H:%M:%S"),
                span.end.with_timezone(&Local).format("%H:%M:%S"),
                format_duration(span.duration()),
                span.key,
            ));
        }

        out.push_str(&format!("(Idle: {})\n\n", format_duration(idle_total)));
    }

    out.trim_end_matches('\n').to_string()
}

/// Weave idle records between the day's spans, walking a cursor from
/// `day_start`. Gaps shorter than one minute are noise and are skipped.
/// The trailing idle never extends past `now`, so an unfinished today does
/// not report idle time that has not happened yet.
fn fill_idles(
    spans: Vec<Span>,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<Span> {
    let min_gap = Duration::minutes(1);
    let mut result = Vec::with_capacity(spans.len());
    let mut cursor = day_start;

    for span in spans {
        if span.start - cursor >= min_gap {
            result.push(Span::idle(cursor, span.start));
        }

        cursor = span.end;
        result.push(span);
    }

    let effective_end = day_end.min(now);
    if effective_end - cursor >= min_gap {
        result.push(Span::idle(cursor, effective_end));
    }

    result
}
