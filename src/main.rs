//! # News Scrap
//!
//! Collects the day's news coverage for one or more search terms from the
//! Naver news listing and prints a morning scrap report.
//!
//! ## Usage
//!
//! ```sh
//! news_scrap -k 서울교통공사 -j ./json
//! ```
//!
//! ## Flow
//!
//! 1. **Config**: optional YAML file, defaults otherwise
//! 2. **Search**: every term is paged concurrently, then merged
//! 3. **Output**: report on stdout, optional JSON copy
//!
//! Ctrl-C stops the search and prints whatever was collected so far.

use chrono::{Duration, Local};
use clap::Parser;
use news_scrap::config::load_config;
use news_scrap::fetch::{NaverFetcher, RetryFetch};
use news_scrap::models::{DateRange, SearchRequest};
use news_scrap::outputs::json;
use news_scrap::outputs::report::{
    DEFAULT_SECTIONS, ScrapBook, render_category_report, report_header,
};
use news_scrap::search;
use news_scrap::utils::ensure_writable_dir;
use std::collections::HashMap;
use std::error::Error;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, ReportFormat};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("news_scrap starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = load_config(args.config.as_deref()).await?;
    info!(base_url = %config.base_url, max_pages = config.max_pages, "Loaded configuration");

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Build request ----
    let now = Local::now().fixed_offset();
    let today = now.date_naive();
    let range = DateRange::new(
        args.from.unwrap_or(today - Duration::days(1)),
        args.to.unwrap_or(today),
    );
    let request = SearchRequest {
        terms: args.keywords.clone(),
        date_range: range,
        max_articles: args.max_articles,
        term_priority: args.priorities.iter().cloned().collect::<HashMap<_, _>>(),
        include_external_direct: args.include_external,
    };
    info!(
        terms = ?request.terms,
        start = %range.start,
        end = %range.end,
        "Search request built"
    );

    // ---- Cancellation on Ctrl-C ----
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing with partial results");
            on_signal.cancel();
        }
    });

    // ---- Search ----
    let fetcher = RetryFetch::new(
        NaverFetcher::new(&config)?,
        config.max_retries,
        StdDuration::from_secs(1),
    );
    let records = search(&fetcher, &request, &config, now, &cancel).await?;

    // ---- Report ----
    let header = report_header(today, &config.holidays);
    let report = match args.format {
        ReportFormat::Category => render_category_report(&header, &records),
        ReportFormat::Scrap => {
            let mut book = ScrapBook::new(DEFAULT_SECTIONS);
            let added = records
                .iter()
                .filter(|r| book.add(&args.section, r))
                .count();
            debug!(section = %args.section, added, "Filled scrap book");
            book.render(&header)
        }
    };
    println!("{report}");

    // ---- JSON output ----
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_results(&records, dir, today).await {
            error!(error = %e, "Failed to write JSON results");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        count = records.len(),
        cancelled = cancel.is_cancelled(),
        "Execution complete"
    );
    Ok(())
}
