//! CLI command definitions.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use rvw_core::store::StoreBackend;

pub mod commands;

/// Browse, filter and search product reviews
#[derive(Parser, Debug)]
#[command(name = "rvw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Storage backend (default: $RVW_BACKEND or sqlite)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<StoreBackend>,

    /// Path to the SQLite database (default: $RVW_DB or reviews.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load reviews from a JSON or NDJSON dump
    Import(ImportArgs),

    /// List reviews matching filters, one page at a time
    List(ListArgs),

    /// Show a single review
    Show(ShowArgs),

    /// Find reviews whose text or title contains any keyword
    Search(SearchArgs),

    /// Rating histogram and per-source counts
    Stats(StatsArgs),

    /// Interactive prompt accepting the query subcommands
    Repl(SessionArgs),

    /// Interactive UI for browsing reviews
    Ui(SessionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Dump file to read
    pub file: PathBuf,

    /// Skip the import when the database is newer than the dump
    #[arg(long)]
    pub if_stale: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Reviews per page
    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    pub page_size: i64,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Review ID
    pub id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Keywords, matched case-insensitively
    #[arg(required = true)]
    pub keywords: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Import this dump first (only if the database is stale)
    #[arg(long)]
    pub import: Option<PathBuf>,
}

/// Filter flags shared by `list` and `stats`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Exact star rating
    #[arg(long)]
    pub rating: Option<u8>,

    /// Minimum star rating
    #[arg(long)]
    pub min_rating: Option<u8>,

    /// Maximum star rating
    #[arg(long)]
    pub max_rating: Option<u8>,

    /// Author contains (case-insensitive)
    #[arg(long)]
    pub author: Option<String>,

    /// Title contains (case-insensitive)
    #[arg(long)]
    pub title: Option<String>,

    /// Product name contains (case-insensitive)
    #[arg(long)]
    pub product: Option<String>,

    /// Review source contains (case-insensitive)
    #[arg(long)]
    pub store: Option<String>,

    /// Reviewed on this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Reviewed on or after this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Reviewed on or before this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Reviewed at or after this time of day (HH:MM[:SS])
    #[arg(long, value_parser = parse_time)]
    pub from_time: Option<NaiveTime>,

    /// Reviewed at or before this time of day (HH:MM[:SS])
    #[arg(long, value_parser = parse_time)]
    pub to_time: Option<NaiveTime>,

    /// Newest first
    #[arg(long)]
    pub sort_date: bool,

    /// Highest rated first (applied before --sort-date)
    #[arg(long)]
    pub sort_rating: bool,
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}', expected YYYY-MM-DD"))
}

/// Parse an `HH:MM` or `HH:MM:SS` time argument.
pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| format!("invalid time '{value}', expected HH:MM or HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_with_filters() {
        let cli = Cli::try_parse_from([
            "rvw",
            "list",
            "--min-rating",
            "4",
            "--author",
            "jane",
            "--from",
            "2023-01-01",
            "--from-time",
            "08:30",
            "--sort-date",
            "--page",
            "2",
        ])
        .unwrap();
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.filters.min_rating, Some(4));
        assert_eq!(args.filters.author.as_deref(), Some("jane"));
        assert_eq!(args.filters.from, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(args.filters.from_time, NaiveTime::from_hms_opt(8, 30, 0));
        assert!(args.filters.sort_date);
        assert_eq!(args.page, 2);
        assert_eq!(args.page_size, 20);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rvw", "stats", "--backend", "memory", "--json"]).unwrap();
        assert_eq!(cli.backend, Some(StoreBackend::Memory));
        assert!(cli.json);
    }

    #[test]
    fn test_negative_page_is_accepted() {
        let cli = Cli::try_parse_from(["rvw", "list", "--page", "-1"]).unwrap();
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.page, -1);
    }

    #[test]
    fn test_search_requires_keywords() {
        assert!(Cli::try_parse_from(["rvw", "search"]).is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["rvw", "list", "--date", "01/02/2023"]).is_err());
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("23:59:59"), Ok(NaiveTime::from_hms_opt(23, 59, 59).unwrap()));
        assert_eq!(parse_time("07:05"), Ok(NaiveTime::from_hms_opt(7, 5, 0).unwrap()));
        assert!(parse_time("25:00").is_err());
    }
}
