//! # clockin-core
//!
//! Core library for clockin - a personal activity and time tracker.
//!
//! This library provides:
//! - Domain types for open and finished activities
//! - SQLite storage layer with the single-open-activity guard
//! - The report view engine (summary, detail, dist, efforts)
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use clockin_core::{Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&config.resolve_database(None)).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! db.start_title("book: Clean Code", "").expect("failed to start");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::{tag, ClosedActivity, OpenActivity, QueryArg};
pub use view::{DayWindow, ViewType};

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
pub mod view;
