//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use docket_fetch::Docket;

/// Longest accepted pause between downloads, in seconds.
const MAX_PACE_SECS: f64 = 60.0;

/// Download the PDF filings of a utility commission docket.
///
/// Walks the docket's yearly listing pages on the commission portal, collects
/// every document link and saves each file once into a local directory.
#[derive(Parser, Debug)]
#[command(name = "docket-fetch")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover and download every document of a docket
    Fetch(FetchArgs),

    /// Discover a docket's documents and print them as JSON without downloading
    List(ListArgs),

    /// Sync a CSV export of the tag spreadsheet into a SQLite database
    SyncTags(SyncTagsArgs),
}

/// Docket and filing-year selection shared by `fetch` and `list`.
#[derive(Args, Debug, Clone)]
pub struct DocketArgs {
    /// Docket number, digits only (e.g. 220066)
    #[arg(value_parser = parse_docket)]
    pub docket: Docket,

    /// First filing year to scan
    #[arg(short = 's', long, value_parser = clap::value_parser!(i32).range(1900..=9999))]
    pub start_year: i32,

    /// Last filing year to scan (defaults to the current year)
    #[arg(short = 'e', long, value_parser = clap::value_parser!(i32).range(1900..=9999))]
    pub end_year: Option<i32>,
}

/// Arguments for `fetch`.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub docket: DocketArgs,

    /// Destination directory (defaults to ./utc_<DOCKET>)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Seconds to wait after each downloaded document (0-60)
    #[arg(short, long, value_parser = parse_pace)]
    pub pace: Option<Duration>,

    /// Reject downloaded bodies that do not start with %PDF-
    #[arg(long)]
    pub require_pdf_header: bool,
}

/// Arguments for `list`.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub docket: DocketArgs,
}

/// Arguments for `sync-tags`.
#[derive(Args, Debug, Clone)]
pub struct SyncTagsArgs {
    /// CSV export of the tag spreadsheet (columns: file_name, tags)
    pub sheet: PathBuf,

    /// SQLite database to sync into (created if missing)
    #[arg(long)]
    pub db: PathBuf,
}

fn parse_docket(value: &str) -> Result<Docket, String> {
    Docket::new(value).map_err(|e| e.to_string())
}

fn parse_pace(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !secs.is_finite() || !(0.0..=MAX_PACE_SECS).contains(&secs) {
        return Err(format!("pace must be between 0 and {MAX_PACE_SECS} seconds"));
    }
    Ok(Duration::from_secs_f64(secs))
}
