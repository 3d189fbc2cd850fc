//! Subcommand implementations
//!
//! Each command is a thin adapter: parse input, call the store and the view
//! engine, print to stdout. Errors bubble up as the command's failure.

use crate::server;
use crate::Command;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clockin_core::view::{self, tag_key, KeyFn};
use clockin_core::{ClosedActivity, Config, Database, OpenActivity, QueryArg};
use std::io::{self, BufRead, Read, Write};

const DEFAULT_TITLE_LIMIT: u8 = 5;

pub fn run(command: Command, db: Database, config: &Config) -> Result<()> {
    match command {
        Command::Start { title, notes, wait } => start(&db, title, &notes, wait),
        Command::Finish { notes } => finish(&db, notes),
        Command::Titles { limit, index } => titles(&db, limit, index),
        Command::Ongoing => ongoing(&db),
        Command::Last { title } => last(&db, title),
        Command::Add {
            title,
            start,
            end,
            notes,
        } => add(&db, &title, &start, &end, &notes),
        Command::Report {
            view_type,
            from,
            to,
            title,
            tag,
            by_tag,
        } => report(&db, config, &view_type, from, to, title, tag, by_tag),
        Command::Serve { addr } => {
            let runtime =
                tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(server::run(&addr, db, config.day.window()))
        }
    }
}

fn start(db: &Database, title: Option<String>, notes: &str, wait: bool) -> Result<()> {
    let title = choose_title_as_needed(db, title)?;
    db.start_title(&title, notes)?;
    println!("(Started: {title})");

    if wait {
        println!("Waiting for notes input, Ctrl-D ends the input and finishes the activity:");
        let notes = read_to_eof().context("failed to read notes, activity not finished")?;
        match db.finish(&notes)? {
            Some(finished) => println!("(Finished: {finished})"),
            None => println!("(NothingToFinish)"),
        }
    }

    Ok(())
}

fn finish(db: &Database, notes: Vec<String>) -> Result<()> {
    let notes = if notes.len() == 1 && notes[0] == "-" {
        read_to_eof()?
    } else {
        notes.join("\n")
    };

    match db.finish(&notes)? {
        Some(title) => println!("(Finished: {title})"),
        None => println!("(NothingToFinish)"),
    }
    Ok(())
}

fn titles(db: &Database, limit: u8, index: bool) -> Result<()> {
    let titles = db.recent_titles(limit.max(1))?;
    for (i, title) in titles.iter().enumerate() {
        if index {
            println!("{}: {}", i + 1, title);
        } else {
            println!("{title}");
        }
    }
    Ok(())
}

fn ongoing(db: &Database) -> Result<()> {
    match db.ongoing()? {
        Some(open) => {
            let minutes = (Utc::now() - open.start).num_minutes();
            println!("{}\n{} minutes ago", open.title, minutes);
        }
        None => println!("No ongoing activity."),
    }
    Ok(())
}

fn last(db: &Database, title: Option<String>) -> Result<()> {
    let title = choose_title_as_needed(db, title)?;
    match db.last_finished(Some(&title))? {
        Some(activity) => println!("{activity}"),
        None => println!("No finished activity of title '{title}'."),
    }
    Ok(())
}

fn add(db: &Database, title: &str, start: &str, end: &str, notes: &str) -> Result<()> {
    let start = parse_local_timestamp(start).context("invalid start timestamp")?;
    let end = parse_local_timestamp(end).context("invalid end timestamp")?;
    if end < start {
        bail!("end must not be before start");
    }

    db.add(&ClosedActivity::new(
        OpenActivity::new(title, start, notes),
        end,
    ))?;
    println!("(Added: {title})");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn report(
    db: &Database,
    config: &Config,
    view_type: &str,
    from: u16,
    to: u16,
    title: Vec<String>,
    tag: Vec<String>,
    by_tag: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let (query_start, query_end) = day_range(
        today - Duration::days(i64::from(from)),
        today - Duration::days(i64::from(to)),
    );

    let filter = if !title.is_empty() {
        QueryArg::Titles(title)
    } else if !tag.is_empty() {
        QueryArg::Tags(tag)
    } else {
        QueryArg::Any
    };

    let activities = db.finished(query_start, query_end, &filter)?;
    let key: Option<KeyFn> = if by_tag { Some(tag_key) } else { None };
    let text = view::render(&activities, view_type, key, config.day.window())?;
    println!("{text}");
    Ok(())
}

/// UTC query bounds spanning `[first 00:00:00, last 23:59:59]` local time.
pub(crate) fn day_range(
    first: NaiveDate,
    last: NaiveDate,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    let start = view::local_datetime(first, NaiveTime::MIN);
    let end = view::local_datetime(last, end_of_day);
    (
        start.with_timezone(&Utc).fixed_offset(),
        end.with_timezone(&Utc).fixed_offset(),
    )
}

/// Parse a local `YYYY-MM-DD HH:MM:SS` timestamp into UTC.
fn parse_local_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("expected 'YYYY-MM-DD HH:MM:SS', got '{s}'"))?;
    let local = naive
        .and_local_timezone(Local)
        .earliest()
        .with_context(|| format!("'{s}' is not a valid local time"))?;
    Ok(local.with_timezone(&Utc))
}

fn choose_title_as_needed(db: &Database, title: Option<String>) -> Result<String> {
    if let Some(title) = title {
        if !title.is_empty() {
            return Ok(title);
        }
    }

    let candidates = db.recent_titles(DEFAULT_TITLE_LIMIT)?;
    choose_string(candidates)
}

fn choose_string(candidates: Vec<String>) -> Result<String> {
    if candidates.is_empty() {
        bail!("nothing to choose from");
    }

    for (i, candidate) in candidates.iter().enumerate() {
        println!("{}: {}", i + 1, candidate);
    }
    print!("Choose index (default 1): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();

    let index = if line.is_empty() {
        1
    } else {
        line.parse::<usize>().context("invalid index")?
    };
    if index < 1 || index > candidates.len() {
        bail!("index out of range");
    }

    Ok(candidates
        .into_iter()
        .nth(index - 1)
        .unwrap_or_default())
}

fn read_to_eof() -> Result<String> {
    let mut buf = String::new();
    io::stdin().lock().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_range_spans_whole_days() {
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (start, end) = day_range(first, last);

        // Bounds are UTC, as the store requires.
        assert_eq!(start.offset().local_minus_utc(), 0);
        assert_eq!(end.offset().local_minus_utc(), 0);

        let local_start = start.with_timezone(&Local);
        let local_end = end.with_timezone(&Local);
        assert_eq!(local_start.date_naive(), first);
        assert_eq!(local_start.time(), NaiveTime::MIN);
        assert_eq!(local_end.date_naive(), last);
        assert_eq!(
            local_end.time(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_parse_local_timestamp() {
        let parsed = parse_local_timestamp("2026-03-02 09:30:00").unwrap();
        assert_eq!(
            parsed.with_timezone(&Local).time(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );

        assert!(parse_local_timestamp("2026-03-02").is_err());
        assert!(parse_local_timestamp("not a time").is_err());
    }
}
