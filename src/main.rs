//! # Medal Harvest
//!
//! A batch harvester for BYOND member medal pages. Given a line-delimited
//! list of member names, it fetches each member's medal tab, normalizes the
//! relative "Earned ..." date text into absolute timestamps, and persists
//! everything into a single resumable JSON archive.
//!
//! ## Pipeline
//!
//! 1. **Plan**: read the target list and, unless `--fresh`, drop members
//!    already present in the archive
//! 2. **Fetch**: process targets batch by batch, each batch's workers
//!    running under a bounded concurrency pool with fixed-delay retries
//! 3. **Normalize**: convert each medal's relative date text to ISO-8601,
//!    keeping the raw text verbatim when it cannot be placed
//! 4. **Persist**: merge every finished batch into the archive atomically,
//!    so an interrupted run loses at most one batch of work
//!
//! ## Usage
//!
//! ```sh
//! medal_harvest -i usernames.txt -o all_users_medals.json
//! ```

use chrono::Local;
use clap::Parser;
use scraper::Selector;
use std::error::Error;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod cli;
mod dates;
mod extract;
mod fetch;
mod harvest;
mod models;
mod report;
mod store;

use cli::Cli;
use fetch::HttpFetcher;
use report::ErrorReporter;
use store::MedalStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("medal_harvest starting up");

    let args = Cli::parse();

    // Startup validation: anything unreadable or unwritable here aborts
    // before the first batch runs.
    let section = Selector::parse(&args.section).map_err(|e| {
        error!(selector = %args.section, error = %e, "Invalid medal section selector");
        e.to_string()
    })?;
    let base_url = Url::parse(&args.base_url).inspect_err(|e| {
        error!(base_url = %args.base_url, error = %e, "Invalid base URL");
    })?;

    let raw_input = std::fs::read_to_string(&args.input).inspect_err(|e| {
        error!(path = %args.input.display(), error = %e, "Cannot read target list");
    })?;
    // Lines are trimmed but otherwise passed through: blank lines and
    // duplicates are the input's problem, not the engine's.
    let targets: Vec<String> = raw_input.lines().map(|l| l.trim().to_string()).collect();
    info!(path = %args.input.display(), count = targets.len(), "Loaded target list");

    let reporter = ErrorReporter::open(&args.error_log).inspect_err(|e| {
        error!(path = %args.error_log.display(), error = %e, "Cannot open error log");
    })?;
    let mut store = MedalStore::open(&args.output, args.store_mode()).inspect_err(|e| {
        error!(path = %args.output.display(), error = %e, "Cannot open archive");
    })?;

    let fetcher = HttpFetcher::new(base_url);
    let config = args.harvest_config();
    let now = Local::now().naive_local();
    info!(?config, %now, "Starting harvest");

    let summary = harvest::run(
        &fetcher, &mut store, &reporter, &section, &targets, now, &config,
    )
    .await?;

    let elapsed = start_time.elapsed();
    info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        medals = summary.medals,
        archived = store.len(),
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Harvest complete"
    );

    Ok(())
}
