//! Database layer for clockin
//!
//! Storage uses SQLite with:
//! - Schema migrations via `PRAGMA user_version`
//! - A single `clocking` table holding open and closed activities
//! - Atomic check-then-insert guards for the single-open-activity invariant

pub mod repo;
pub mod schema;

pub use repo::Database;
