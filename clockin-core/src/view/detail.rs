//! Detail view: per group key, the individual spans in start order.

use super::{format_duration, KeyFn};
use crate::types::ClosedActivity;
use chrono::Local;
use std::collections::BTreeMap;

pub(super) fn render(activities: &[ClosedActivity], key: KeyFn) -> String {
    let mut detail: BTreeMap<String, Vec<&ClosedActivity>> = BTreeMap::new();

    // Query order is start-ascending; keep it within each group.
    for activity in activities {
        detail.entry(key(activity)).or_default().push(activity);
    }

    let mut out = String::new();
    for (key, group) in &detail {
        out.push_str(&format!("{key}\n"));

        for activity in group {
            out.push_str(&format!(
                "  {} ~ {} | {}\n",
                activity
                    .start()
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %a %H:%M"),
                activity.end.with_timezone(&Local).format("%H:%M"),
                format_duration(activity.duration()),
            ));
        }

        out.push('\n');
    }

    out.trim_end_matches('\n').to_string()
}
