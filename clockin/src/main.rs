//! clockin - personal activity and time tracker
//!
//! Records when activities start and finish, keeps notes, and reports where
//! the time went. The `serve` subcommand exposes the same store over a local
//! HTTP API.

mod commands;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clockin_core::{Config, Database};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clockin")]
#[command(about = "Track activities and report where the time went")]
#[command(version)]
struct Cli {
    /// Path of the database file (overrides CLOCKIN_DB and the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an activity
    Start {
        /// Title of the activity. Chosen interactively from recent titles
        /// when not given.
        title: Option<String>,

        /// Notes of the activity
        #[arg(long, default_value = "")]
        notes: String,

        /// Wait for notes input until Ctrl-D, then finish the activity
        #[arg(short, long)]
        wait: bool,
    },

    /// Finish the ongoing activity
    Finish {
        /// Notes to append, each value a line. A single '-' reads from stdin.
        #[arg(long)]
        notes: Vec<String>,
    },

    /// Print recent finished titles
    Titles {
        /// Number of titles to display
        #[arg(short = 'n', long, default_value_t = 5)]
        limit: u8,

        /// Prefix titles with an index starting from 1
        #[arg(short, long)]
        index: bool,
    },

    /// Show the currently ongoing activity
    Ongoing,

    /// Show details of the last finished activity
    Last {
        /// Title of the activity. Chosen interactively when not given.
        title: Option<String>,
    },

    /// Backfill an already-finished activity
    Add {
        /// Title of the activity
        title: String,

        /// Start timestamp, local 'YYYY-MM-DD HH:MM:SS'
        start: String,

        /// End timestamp, local 'YYYY-MM-DD HH:MM:SS'
        end: String,

        /// Notes of the activity
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Show a time usage report
    Report {
        /// Type of the report: summary, detail, dist, or efforts
        #[arg(long = "type", default_value = "summary")]
        view_type: String,

        /// Report from '@today - FROM' days, at 00:00:00 local time
        #[arg(short, long, default_value_t = 0)]
        from: u16,

        /// Report to '@today - TO' days, at 23:59:59 local time
        #[arg(short, long, default_value_t = 0)]
        to: u16,

        /// Filter by exact titles
        #[arg(long)]
        title: Vec<String>,

        /// Filter by tags
        #[arg(long, conflicts_with = "title")]
        tag: Vec<String>,

        /// Group by tag instead of title
        #[arg(long)]
        by_tag: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8080
        addr: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard =
        clockin_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = config.resolve_database(cli.db);
    tracing::debug!(path = %db_path.display(), "opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    commands::run(cli.command, db, &config)
}
