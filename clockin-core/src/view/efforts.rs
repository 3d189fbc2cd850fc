//! Efforts view: accumulated duration per group key, no day bucketing.

use super::{format_duration, KeyFn};
use crate::types::ClosedActivity;
use chrono::Duration;
use std::collections::BTreeMap;

pub(super) fn render(activities: &[ClosedActivity], key: KeyFn) -> String {
    let mut efforts: BTreeMap<String, Duration> = BTreeMap::new();

    for activity in activities {
        let total = efforts
            .entry(key(activity))
            .or_insert_with(Duration::zero);
        *total = *total + activity.duration();
    }

    let mut out = String::new();
    for (key, duration) in &efforts {
        out.push_str(&format!("{}: {}\n", key, format_duration(*duration)));
    }

    out.trim_end_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{day, local_activity};
    use super::super::{tag_key, title_key};
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_efforts_accumulates_across_days() {
        let d1 = day();
        let d2 = d1 + Duration::days(1);
        let activities = vec![
            local_activity("a", d1, (9, 0, 0), (10, 0, 0)),
            local_activity("a", d2, (9, 0, 0), (10, 30, 0)),
            local_activity("b", d1, (11, 0, 0), (11, 20, 0)),
        ];

        let text = render(&activities, title_key);
        assert_eq!(text, "a: 2h30m\nb: 20m");
    }

    #[test]
    fn test_efforts_by_tag() {
        let activities = vec![
            local_activity("book: Clean Code", day(), (9, 0, 0), (10, 0, 0)),
            local_activity("book: SICP", day(), (10, 0, 0), (11, 0, 0)),
        ];

        assert_eq!(render(&activities, tag_key), "book: 2h");
    }
}
