//! Database repository layer
//!
//! Query and insert operations over the `clocking` table. The store is the
//! single source of truth for the "at most one open activity" invariant:
//! `start` and `add` run their check-then-insert inside a transaction so two
//! concurrent writers (even from separate processes) cannot both succeed.

use crate::error::{Error, Result};
use crate::types::{ClosedActivity, OpenActivity, QueryArg, TAG_SEPARATOR};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Database handle (single connection, serialized access)
pub struct Database {
    conn: Mutex<Connection>,
}

/// Serialize a timestamp the way the store expects it: RFC 3339, UTC,
/// second precision.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Raw row of the `clocking` table before timestamp parsing
type RawRow = (String, String, Option<String>, Option<String>);

fn row_to_closed(row: RawRow) -> Result<ClosedActivity> {
    let (title, start, end, notes) = row;
    let end = end.ok_or_else(|| {
        Error::Config("closed activity row without end timestamp".to_string())
    })?;

    Ok(ClosedActivity::new(
        OpenActivity::new(title, parse_ts(&start)?, notes.unwrap_or_default()),
        parse_ts(&end)?,
    ))
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode so a report can run while another process writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Start an activity.
    ///
    /// Fails with [`Error::OngoingExists`] if an open activity exists, and
    /// with [`Error::DuplicateActivity`] if an activity with the same
    /// `(title, start)` was already recorded. Both checks and the insert run
    /// in one transaction.
    pub fn start(&self, activity: &OpenActivity) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let open_count: i64 =
            tx.query_row("SELECT count(1) FROM clocking WHERE end IS NULL", [], |r| {
                r.get(0)
            })?;
        if open_count > 0 {
            return Err(Error::OngoingExists);
        }

        let start = ts(activity.start);
        let duplicates: i64 = tx.query_row(
            "SELECT count(1) FROM clocking WHERE title = ? AND start = ?",
            params![activity.title, start],
            |r| r.get(0),
        )?;
        if duplicates > 0 {
            return Err(Error::DuplicateActivity);
        }

        tx.execute(
            "INSERT INTO clocking (title, start, notes) VALUES (?, ?, ?)",
            params![activity.title, start, activity.notes],
        )?;
        tx.commit()?;

        tracing::info!(title = %activity.title, "activity started");
        Ok(())
    }

    /// Start an activity with the given title and notes, and now as start.
    pub fn start_title(&self, title: &str, notes: &str) -> Result<()> {
        self.start(&OpenActivity::new(title, Utc::now(), notes))
    }

    /// Finish the open activity (if any) by appending notes and stamping the
    /// end timestamp. Returns the finished title, or `None` when nothing was
    /// open; that case is not an error.
    pub fn finish(&self, notes: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let title: Option<String> = conn
            .query_row(
                "UPDATE clocking
                 SET end = ?, notes = IFNULL(notes, '') || ?
                 WHERE id IN (SELECT max(id) FROM clocking WHERE end IS NULL)
                 RETURNING title",
                params![ts(Utc::now()), notes],
                |r| r.get(0),
            )
            .optional()?;

        if let Some(title) = &title {
            tracing::info!(%title, "activity finished");
        }
        Ok(title)
    }

    /// At most `limit` distinct titles of finished activities, most recently
    /// started first.
    pub fn recent_titles(&self, limit: u8) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT title, max(start) FROM clocking
             WHERE end IS NOT NULL
             GROUP BY title
             ORDER BY max(start) DESC
             LIMIT ?",
        )?;

        let titles = stmt
            .query_map([limit], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(titles)
    }

    /// The open activity, if any.
    pub fn ongoing(&self) -> Result<Option<OpenActivity>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(String, String, Option<String>)> = conn
            .query_row(
                "SELECT title, start, notes FROM clocking WHERE end IS NULL",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;

        match row {
            Some((title, start, notes)) => Ok(Some(OpenActivity::new(
                title,
                parse_ts(&start)?,
                notes.unwrap_or_default(),
            ))),
            None => Ok(None),
        }
    }

    /// The most recently finished activity, optionally restricted to an
    /// exact title.
    pub fn last_finished(&self, title: Option<&str>) -> Result<Option<ClosedActivity>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<RawRow> = match title {
            Some(title) => conn
                .query_row(
                    "SELECT title, start, end, notes FROM clocking
                     WHERE id IN (
                         SELECT max(id) FROM clocking
                         WHERE title = ? AND end IS NOT NULL)",
                    [title],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT title, start, end, notes FROM clocking
                     WHERE id IN (
                         SELECT max(id) FROM clocking
                         WHERE end IS NOT NULL)",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
                )
                .optional()?,
        };

        row.map(row_to_closed).transpose()
    }

    /// Finished activities with `start` within `[query_start, query_end]`,
    /// ordered by start ascending.
    ///
    /// Both bounds must be UTC; a non-zero offset on either is rejected with
    /// [`Error::NonUtcTime`] rather than silently converted.
    pub fn finished(
        &self,
        query_start: DateTime<FixedOffset>,
        query_end: DateTime<FixedOffset>,
        filter: &QueryArg,
    ) -> Result<Vec<ClosedActivity>> {
        if query_start.offset().local_minus_utc() != 0
            || query_end.offset().local_minus_utc() != 0
        {
            return Err(Error::NonUtcTime);
        }

        let mut sql = String::from(
            "SELECT title, start, end, notes FROM clocking
             WHERE end IS NOT NULL AND start >= ? AND start <= ?",
        );
        let mut params: Vec<String> = vec![
            ts(query_start.with_timezone(&Utc)),
            ts(query_end.with_timezone(&Utc)),
        ];

        let mut predicates: Vec<&str> = Vec::new();
        match filter {
            QueryArg::Any => {}
            QueryArg::Titles(titles) => {
                for title in titles {
                    predicates.push("title = ?");
                    params.push(title.clone());
                }
            }
            QueryArg::Tags(tags) => {
                // A bare title with no separator is its own tag, so each tag
                // matches both prefixed titles and the exact title.
                for tag in tags {
                    predicates.push("title LIKE ?");
                    params.push(format!("{tag}{TAG_SEPARATOR}%"));
                    predicates.push("title = ?");
                    params.push(tag.clone());
                }
            }
        }
        if !predicates.is_empty() {
            sql.push_str(" AND (");
            sql.push_str(&predicates.join(" OR "));
            sql.push(')');
        }
        sql.push_str(" ORDER BY start");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
            })?
            .collect::<rusqlite::Result<Vec<RawRow>>>()?;

        rows.into_iter().map(row_to_closed).collect()
    }

    /// Insert an already-finished activity, for backfilling. Duplicate
    /// `(title, start)` pairs are rejected like in [`Database::start`].
    pub fn add(&self, activity: &ClosedActivity) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let start = ts(activity.start());
        let duplicates: i64 = tx.query_row(
            "SELECT count(1) FROM clocking WHERE title = ? AND start = ?",
            params![activity.title(), start],
            |r| r.get(0),
        )?;
        if duplicates > 0 {
            return Err(Error::DuplicateActivity);
        }

        tx.execute(
            "INSERT INTO clocking (title, start, end, notes) VALUES (?, ?, ?, ?)",
            params![activity.title(), start, ts(activity.end), activity.notes()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn utc(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
    }

    fn closed(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ClosedActivity {
        ClosedActivity::new(OpenActivity::new(title, start, ""), end)
    }

    #[test]
    fn test_start_then_finish_round_trip() {
        let db = test_db();
        db.start_title("book: Clean Code", "ch 1").unwrap();

        let open = db.ongoing().unwrap().expect("activity should be open");
        assert_eq!(open.title, "book: Clean Code");
        assert_eq!(open.notes, "ch 1");

        let finished = db.finish("\nch 2").unwrap();
        assert_eq!(finished.as_deref(), Some("book: Clean Code"));
        assert!(db.ongoing().unwrap().is_none());

        let last = db.last_finished(None).unwrap().unwrap();
        assert_eq!(last.title(), "book: Clean Code");
        assert_eq!(last.notes(), "ch 1\nch 2");
        assert!(last.end >= last.start());
    }

    #[test]
    fn test_finish_with_nothing_open_is_not_an_error() {
        let db = test_db();
        assert_eq!(db.finish("notes").unwrap(), None);
    }

    #[test]
    fn test_start_rejected_while_ongoing() {
        let db = test_db();
        db.start_title("a", "").unwrap();

        let err = db.start_title("b", "").unwrap_err();
        assert!(matches!(err, Error::OngoingExists));
    }

    #[test]
    fn test_ongoing_check_precedes_duplicate_check() {
        let db = test_db();
        let activity = OpenActivity::new("a", utc(1, 9, 0), "");
        db.start(&activity).unwrap();

        // Same (title, start) while still open: the ongoing guard fires first.
        let err = db.start(&activity).unwrap_err();
        assert!(matches!(err, Error::OngoingExists));
    }

    #[test]
    fn test_duplicate_start_rejected() {
        let db = test_db();
        db.add(&closed("a", utc(1, 9, 0), utc(1, 10, 0))).unwrap();

        let err = db.start(&OpenActivity::new("a", utc(1, 9, 0), "")).unwrap_err();
        assert!(matches!(err, Error::DuplicateActivity));
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let db = test_db();
        let activity = closed("a", utc(1, 9, 0), utc(1, 10, 0));
        db.add(&activity).unwrap();

        let err = db.add(&activity).unwrap_err();
        assert!(matches!(err, Error::DuplicateActivity));
    }

    #[test]
    fn test_recent_titles_distinct_most_recent_first() {
        let db = test_db();
        db.add(&closed("a", utc(1, 9, 0), utc(1, 10, 0))).unwrap();
        db.add(&closed("b", utc(2, 9, 0), utc(2, 10, 0))).unwrap();
        db.add(&closed("a", utc(3, 9, 0), utc(3, 10, 0))).unwrap();
        // Open activities do not contribute titles.
        db.start(&OpenActivity::new("c", utc(4, 9, 0), "")).unwrap();

        let titles = db.recent_titles(5).unwrap();
        assert_eq!(titles, vec!["a".to_string(), "b".to_string()]);

        let titles = db.recent_titles(1).unwrap();
        assert_eq!(titles, vec!["a".to_string()]);
    }

    #[test]
    fn test_last_finished_by_title() {
        let db = test_db();
        db.add(&closed("a", utc(1, 9, 0), utc(1, 10, 0))).unwrap();
        db.add(&closed("b", utc(2, 9, 0), utc(2, 10, 0))).unwrap();

        let last = db.last_finished(Some("a")).unwrap().unwrap();
        assert_eq!(last.start(), utc(1, 9, 0));

        assert!(db.last_finished(Some("missing")).unwrap().is_none());
    }

    #[test]
    fn test_finished_rejects_non_utc_bounds() {
        let db = test_db();
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_bound = offset.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let utc_bound = utc(2, 0, 0).fixed_offset();

        let err = db.finished(local_bound, utc_bound, &QueryArg::Any).unwrap_err();
        assert!(matches!(err, Error::NonUtcTime));

        let err = db.finished(utc_bound, local_bound, &QueryArg::Any).unwrap_err();
        assert!(matches!(err, Error::NonUtcTime));
    }

    #[test]
    fn test_finished_orders_by_start_ascending() {
        let db = test_db();
        db.add(&closed("b", utc(1, 12, 0), utc(1, 13, 0))).unwrap();
        db.add(&closed("a", utc(1, 9, 0), utc(1, 10, 0))).unwrap();

        let rows = db
            .finished(
                utc(1, 0, 0).fixed_offset(),
                utc(2, 0, 0).fixed_offset(),
                &QueryArg::Any,
            )
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|a| a.title().to_string()).collect();
        assert_eq!(titles, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_finished_title_filter() {
        let db = test_db();
        db.add(&closed("a", utc(1, 9, 0), utc(1, 10, 0))).unwrap();
        db.add(&closed("b", utc(1, 11, 0), utc(1, 12, 0))).unwrap();

        let rows = db
            .finished(
                utc(1, 0, 0).fixed_offset(),
                utc(2, 0, 0).fixed_offset(),
                &QueryArg::Titles(vec!["a".to_string()]),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title(), "a");
    }

    #[test]
    fn test_finished_tag_filter() {
        let db = test_db();
        db.add(&closed("book: Clean Code", utc(1, 9, 0), utc(1, 10, 0)))
            .unwrap();
        db.add(&closed("book: SICP", utc(1, 11, 0), utc(1, 12, 0)))
            .unwrap();
        db.add(&closed("chores", utc(1, 13, 0), utc(1, 14, 0))).unwrap();

        let rows = db
            .finished(
                utc(1, 0, 0).fixed_offset(),
                utc(2, 0, 0).fixed_offset(),
                &QueryArg::Tags(vec!["book".to_string()]),
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|a| a.tag() == "book"));
    }

    #[test]
    fn test_finished_tag_filter_matches_separator_less_title() {
        let db = test_db();
        db.add(&closed("chores", utc(1, 9, 0), utc(1, 10, 0))).unwrap();
        db.add(&closed("chores: garden", utc(1, 11, 0), utc(1, 12, 0)))
            .unwrap();
        db.add(&closed("choresleft", utc(1, 13, 0), utc(1, 14, 0)))
            .unwrap();

        // "chores" has no separator, so its derived tag is the full title.
        let rows = db
            .finished(
                utc(1, 0, 0).fixed_offset(),
                utc(2, 0, 0).fixed_offset(),
                &QueryArg::Tags(vec!["chores".to_string()]),
            )
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|a| a.title().to_string()).collect();
        assert_eq!(
            titles,
            vec!["chores".to_string(), "chores: garden".to_string()]
        );
    }

    #[test]
    fn test_finished_range_bounds_inclusive() {
        let db = test_db();
        db.add(&closed("a", utc(1, 9, 0), utc(1, 10, 0))).unwrap();

        let rows = db
            .finished(
                utc(1, 9, 0).fixed_offset(),
                utc(1, 9, 0).fixed_offset(),
                &QueryArg::Any,
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
