//! CLI entry point for docket-fetch.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use docket_fetch::{
    CancelFlag, DEFAULT_PACE, Database, Docket, DocketFetcher, EventSink, FetchRequest,
    HttpClient, LinkDiscovery, TracingSink, default_destination, read_tag_sheet, sync_tags,
};
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod progress;
mod terminal;

use app_config::FileConfig;
use cli::{Cli, Command, FetchArgs, ListArgs, SyncTagsArgs};
use progress::ProgressSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    terminal::init_tracing(terminal::default_log_level(cli.verbose, cli.quiet));
    debug!(?cli, "CLI arguments parsed");

    let loaded = app_config::load_default_file_config()?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "loaded config file");
    }

    match cli.command {
        Command::Fetch(args) => run_fetch(args, &loaded.config, cli.quiet).await,
        Command::List(args) => run_list(args, &loaded.config).await,
        Command::SyncTags(args) => run_sync_tags(args, cli.quiet).await,
    }
}

async fn run_fetch(args: FetchArgs, config: &FileConfig, quiet: bool) -> Result<()> {
    let client = build_client(config)?;
    let cancel = spawn_interrupt_watcher();

    let progress = terminal::should_use_progress(
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    )
    .then(|| Arc::new(ProgressSink::new()));
    let sink: Arc<dyn EventSink> = match &progress {
        Some(progress) => Arc::clone(progress) as Arc<dyn EventSink>,
        None => Arc::new(TracingSink),
    };

    let fetcher = DocketFetcher::new(client)
        .with_portal_base(config.portal_base_url())?
        .with_sink(sink)
        .with_cancel_flag(cancel)
        .require_pdf_header(args.require_pdf_header || config.require_pdf_header == Some(true));

    let docket = args.docket.docket;
    let destination = resolve_destination(args.out, config.output_root.as_deref(), &docket);
    let mut request = FetchRequest::new(docket, args.docket.start_year)
        .destination(destination.clone())
        .pace(args.pace.or_else(|| config.pace()).unwrap_or(DEFAULT_PACE));
    request.end_year = args.docket.end_year;

    info!(
        docket = %request.docket,
        destination = %destination.display(),
        "Docket fetch starting"
    );
    let result = fetcher.fetch_docket_with_report(&request).await;
    if let Some(progress) = &progress {
        progress.finish();
    }
    let (index, report) = result?;

    if report.interrupted {
        warn!("Interrupted; rerun the same command to resume");
    }
    if !quiet {
        println!(
            "{} documents discovered: {} saved, {} already present, {} failed -> {}",
            index.len(),
            report.saved(),
            report.skipped(),
            report.failed(),
            destination.display()
        );
    }
    Ok(())
}

async fn run_list(args: ListArgs, config: &FileConfig) -> Result<()> {
    let discovery = LinkDiscovery::new(build_client(config)?)
        .with_portal_base(config.portal_base_url())?
        .with_cancel_flag(spawn_interrupt_watcher());

    let index = discovery
        .discover(
            &args.docket.docket,
            args.docket.start_year,
            args.docket.end_year,
        )
        .await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&index).context("Failed to serialize link index")?
    );
    Ok(())
}

async fn run_sync_tags(args: SyncTagsArgs, quiet: bool) -> Result<()> {
    let rows = read_tag_sheet(&args.sheet).await?;
    let db = Database::open(&args.db)
        .await
        .with_context(|| format!("Failed to open database '{}'", args.db.display()))?;

    let report = sync_tags(&db, &rows).await;
    db.close().await;
    let report = report?;

    if !quiet {
        println!(
            "{} files synced ({} new), {} new tags, {} links written",
            report.files_synced, report.files_created, report.tags_created, report.links_written
        );
    }
    Ok(())
}

fn build_client(config: &FileConfig) -> Result<HttpClient> {
    let client = HttpClient::with_settings(config.timeouts(), config.user_agent.as_deref())
        .context("Failed to create HTTP client")?;
    debug!(user_agent = client.user_agent(), "HTTP client ready");
    Ok(client)
}

/// `--out` wins; otherwise `utc_<docket>` under the configured output root or
/// the working directory.
fn resolve_destination(
    out: Option<PathBuf>,
    output_root: Option<&Path>,
    docket: &Docket,
) -> PathBuf {
    match (out, output_root) {
        (Some(out), _) => out,
        (None, Some(root)) => root.join(format!("utc_{docket}")),
        (None, None) => default_destination(docket),
    }
}

fn spawn_interrupt_watcher() -> CancelFlag {
    let flag = CancelFlag::new();
    let signal = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current request");
            signal.cancel();
        }
    });
    flag
}
