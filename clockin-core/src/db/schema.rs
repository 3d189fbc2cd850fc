//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema.
    //
    // An open activity is a row with `end IS NULL`; finishing it stamps the
    // end timestamp in place. Timestamps are RFC 3339 UTC strings, which
    // order lexicographically the same as chronologically.
    r#"
    CREATE TABLE IF NOT EXISTS clocking (
        id      INTEGER PRIMARY KEY,
        title   TEXT NOT NULL,
        start   TEXT NOT NULL,
        end     TEXT NULL,
        notes   TEXT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_clocking_start ON clocking(start);
    CREATE INDEX IF NOT EXISTS idx_clocking_title_start ON clocking(title, start);
    "#,
];

/// Run all pending migrations on the connection
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version <= current {
            continue;
        }

        tracing::info!(version, "Applying schema migration");
        conn.execute_batch(migration)?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
