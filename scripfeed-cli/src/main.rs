//! scripfeed CLI: fetch and status commands.
//!
//! Commands:
//! - `fetch`: page through exchange announcements per security and date chunk,
//!   appending each page to `{output_dir}/{ISIN}.json`
//! - `fetch --dry-run`: log the planned requests without touching the network
//! - `status`: report record count and size of every stored collection
//!
//! Logs go to stderr and to a daily-rolled file under `--log-dir`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scripfeed_core::config::{parse_date, parse_header, FetchConfig};
use scripfeed_core::data::{
    fetch_announcements, plan_requests, AnnouncementStore, BseProvider, PageProvider,
    TracingProgress,
};
use scripfeed_core::planner::plan;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "scripfeed";
const LOG_FILES_KEPT: usize = 7;

#[derive(Parser)]
#[command(
    name = "scripfeed",
    about = "scripfeed - exchange announcement downloader"
)]
struct Cli {
    /// Verbose (debug) logging. RUST_LOG overrides this.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// Directory for the rolling log file.
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch announcements and append them to per-ISIN JSON files.
    Fetch(FetchArgs),
    /// Report record count and size of each stored collection.
    Status {
        /// Output directory. Defaults to ./announcements.
        #[arg(long, default_value = "announcements")]
        output_dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct FetchArgs {
    /// TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Securities as ISIN=scripCode pairs, comma-separated.
    #[arg(long)]
    securities: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Longest date span per remote query, in days.
    #[arg(long)]
    max_span_days: Option<u32>,

    /// Output directory. Defaults to ./announcements.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Records per full page.
    #[arg(long)]
    page_size: Option<usize>,

    /// Extra HTTP header KEY=VALUE (repeatable).
    #[arg(long = "header")]
    headers: Vec<String>,

    /// Log the planned requests without fetching anything.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    // Flushes the log file on drop, so it must outlive the command.
    let _guard = init_tracing(cli.verbose, &cli.log_dir)?;

    match cli.command {
        Commands::Fetch(args) => run_fetch(args),
        Commands::Status { output_dir } => run_status(&output_dir).map(|()| ExitCode::SUCCESS),
    }
}

fn init_tracing(verbose: bool, log_dir: &Path) -> Result<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(log_dir)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    Ok(guard)
}

/// Daily-rolled `scripfeed.YYYY-MM-DD.log` files, keeping the most recent few.
fn file_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(LOG_FILES_KEPT)
        .build(log_dir)
        .with_context(|| format!("failed to open log file in {}", log_dir.display()))
}

/// Merge flags over the config file (or defaults).
fn resolve_config(args: &FetchArgs) -> Result<FetchConfig> {
    let mut config = match &args.config {
        Some(path) => FetchConfig::from_file(path)?,
        None => FetchConfig::default(),
    };

    if let Some(securities) = &args.securities {
        config.securities = Some(securities.clone());
    }
    if let Some(start) = &args.start {
        config.start = Some(parse_date(start)?);
    }
    if let Some(end) = &args.end {
        config.end = Some(parse_date(end)?);
    }
    if let Some(span) = args.max_span_days {
        config.max_span_days = span;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(size) = args.page_size {
        config.endpoint.page_size = size;
    }
    for item in &args.headers {
        let (key, value) = parse_header(item)?;
        config.endpoint.headers.insert(key, value);
    }

    Ok(config)
}

fn run_fetch(args: FetchArgs) -> Result<ExitCode> {
    let config = resolve_config(&args)?;

    let securities = config.parsed_securities()?;
    let start = config.require_start()?;
    let end = config
        .end
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let chunks = plan(start, Some(end), config.max_span_days)?;

    let provider = BseProvider::new(config.endpoint.clone())?;
    let store = AnnouncementStore::new(&config.output_dir);

    info!("=== Announcement fetch ===");
    info!("Provider  : {}", provider.name());
    info!("Endpoint  : {}", config.endpoint.base_url);
    info!(
        "Window    : {start} .. {end} ({} chunks, max span {} days)",
        chunks.len(),
        config.max_span_days
    );
    info!("Securities: {}", securities.len());
    info!("Out dir   : {}", store.output_dir().display());
    info!("Dry run   : {}", args.dry_run);
    if !config.endpoint.headers.is_empty() {
        debug!("Headers   : {:?}", config.endpoint.headers);
    }

    if args.dry_run {
        for (security, _chunk, request) in plan_requests(&provider, &securities, &chunks) {
            info!(
                "[DRY] {request} -> {}",
                store.path_for(&security.isin).display()
            );
        }
        info!("Dry-run complete.");
        return Ok(ExitCode::SUCCESS);
    }

    let report = fetch_announcements(&provider, &store, &securities, &chunks, &TracingProgress);

    let failed = report.failed().count();
    info!(
        "Done. Securities ok: {}, failed: {failed}, records written: {}",
        report.outcomes.len() - failed,
        report.total_records()
    );

    if !report.all_succeeded() {
        for outcome in report.failed() {
            if let Some(err) = &outcome.error {
                eprintln!("Error for {}: {err}", outcome.security);
            }
        }
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

fn run_status(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        println!("Output directory does not exist: {}", output_dir.display());
        return Ok(());
    }

    let store = AnnouncementStore::new(output_dir);
    let summaries = store.summaries()?;
    if summaries.is_empty() {
        println!("No collections in: {}", output_dir.display());
        return Ok(());
    }

    let total_records: usize = summaries.iter().filter_map(|s| s.records.as_ref().ok()).sum();
    let total_size: u64 = summaries.iter().map(|s| s.size_bytes).sum();
    let corrupt = summaries.iter().filter(|s| s.is_corrupt()).count();

    println!("Output: {}", output_dir.display());
    println!("Collections: {}", summaries.len());
    if corrupt > 0 {
        println!("Corrupt: {corrupt}");
    }
    println!("Records: {total_records}");
    println!("Total size: {}", format_size(total_size));
    println!();
    println!("{:<14} {:>10} {:>10}", "ISIN", "Records", "Size");
    println!("{}", "-".repeat(36));
    for summary in &summaries {
        let records = match &summary.records {
            Ok(n) => n.to_string(),
            Err(_) => "corrupt".to_string(),
        };
        println!(
            "{:<14} {:>10} {:>10}",
            summary.isin,
            records,
            format_size(summary.size_bytes)
        );
        if let Err(reason) = &summary.records {
            println!("  {reason}");
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_args(argv: &[&str]) -> FetchArgs {
        let mut full = vec!["scripfeed", "fetch"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Fetch(args) => args,
            Commands::Status { .. } => panic!("expected fetch"),
        }
    }

    #[test]
    fn flags_fill_an_empty_config() {
        let args = fetch_args(&[
            "--securities",
            "ISIN1=500001",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--max-span-days",
            "15",
            "--page-size",
            "20",
            "--header",
            "Cookie=a=b",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.securities.as_deref(), Some("ISIN1=500001"));
        assert_eq!(config.start, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(config.end, chrono::NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(config.max_span_days, 15);
        assert_eq!(config.endpoint.page_size, 20);
        assert_eq!(config.endpoint.headers.get("Cookie").unwrap(), "a=b");
        // Default headers survive a CLI override.
        assert!(config.endpoint.headers.contains_key("Referer"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetch.toml");
        std::fs::write(
            &path,
            "securities = \"ISIN1=500001\"\nstart = \"2023-06-01\"\nmax_span_days = 10\n",
        )
        .unwrap();

        let path_str = path.to_str().unwrap();
        let args = fetch_args(&["--config", path_str, "--start", "2024-01-01"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.start, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(config.max_span_days, 10);
        assert_eq!(config.securities.as_deref(), Some("ISIN1=500001"));
    }

    #[test]
    fn bad_date_flag_is_an_error() {
        let args = fetch_args(&["--start", "01-01-2024"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn log_dir_defaults_and_can_be_overridden() {
        let cli = Cli::parse_from(["scripfeed", "status"]);
        assert_eq!(cli.log_dir, PathBuf::from("logs"));
        let cli = Cli::parse_from(["scripfeed", "status", "--log-dir", "/tmp/sf-logs"]);
        assert_eq!(cli.log_dir, PathBuf::from("/tmp/sf-logs"));
    }

    #[test]
    fn file_appender_creates_dated_log_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let mut appender = file_appender(&log_dir).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&log_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(
            names
                .iter()
                .any(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(".log")),
            "{names:?}"
        );
    }

    #[test]
    fn status_lists_corrupt_collection_beside_good_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnouncementStore::new(dir.path());
        let mut good = store.open("GOOD").unwrap();
        good.append_page(&[serde_json::json!({"a": 1})]).unwrap();
        good.finish().unwrap();
        std::fs::write(dir.path().join("BAD.json"), "{\n  \"b\":").unwrap();

        assert!(run_status(dir.path()).is_ok());
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
