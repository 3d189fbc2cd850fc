//! Summary view: per local day, accumulated duration per group key.

use super::{format_duration, local_day, KeyFn};
use crate::types::ClosedActivity;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

pub(super) fn render(activities: &[ClosedActivity], key: KeyFn) -> String {
    let mut summary: BTreeMap<NaiveDate, BTreeMap<String, Duration>> = BTreeMap::new();

    for activity in activities {
        let by_key = summary.entry(local_day(activity)).or_default();
        let total = by_key
            .entry(key(activity))
            .or_insert_with(Duration::zero);
        *total = *total + activity.duration();
    }

    let mut out = String::new();
    for (day, by_key) in &summary {
        out.push_str(&format!("{}\n", day.format("%Y-%m-%d")));

        let mut day_total = Duration::zero();
        for (key, duration) in by_key {
            out.push_str(&format!("  {}: {}\n", key, format_duration(*duration)));
            day_total = day_total + *duration;
        }

        out.push_str(&format!("(Total): {}\n\n", format_duration(day_total)));
    }

    out.trim_end_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{day, local_activity};
    use super::super::{tag_key, title_key};
    use super::*;

    #[test]
    fn test_summary_accumulates_per_key() {
        let activities = vec![
            local_activity("book: Clean Code", day(), (9, 0, 0), (10, 0, 0)),
            local_activity("chores", day(), (10, 0, 0), (10, 30, 0)),
            local_activity("book: Clean Code", day(), (11, 0, 0), (11, 30, 0)),
        ];

        let text = render(&activities, title_key);
        assert!(text.contains("  book: Clean Code: 1h30m\n"));
        assert!(text.contains("  chores: 30m\n"));
        assert!(text.contains("(Total): 2h"));
    }

    #[test]
    fn test_summary_total_equals_sum_of_keys() {
        let activities = vec![
            local_activity("a", day(), (9, 0, 0), (9, 40, 0)),
            local_activity("b", day(), (10, 0, 0), (10, 50, 0)),
            local_activity("c", day(), (11, 0, 0), (12, 30, 0)),
        ];

        let text = render(&activities, title_key);
        // 40m + 50m + 1h30m
        assert!(text.contains("(Total): 3h"));
    }

    #[test]
    fn test_summary_input_order_does_not_matter() {
        let mut activities = vec![
            local_activity("a", day(), (9, 0, 0), (10, 0, 0)),
            local_activity("b", day(), (10, 0, 0), (11, 0, 0)),
            local_activity("a", day(), (12, 0, 0), (13, 0, 0)),
        ];

        let forward = render(&activities, title_key);
        activities.reverse();
        let backward = render(&activities, title_key);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_summary_groups_by_tag() {
        let activities = vec![
            local_activity("book: Clean Code", day(), (9, 0, 0), (10, 0, 0)),
            local_activity("book: SICP", day(), (10, 0, 0), (11, 0, 0)),
        ];

        let text = render(&activities, tag_key);
        assert!(text.contains("  book: 2h\n"));
        assert!(!text.contains("Clean Code"));
    }

    #[test]
    fn test_summary_empty_input() {
        assert_eq!(render(&[], title_key), "");
    }
}
