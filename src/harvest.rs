//! Batch harvest orchestration.
//!
//! [`run`] drives the whole harvest: it filters the target list against the
//! archive's progress set, partitions what remains into contiguous batches,
//! runs each batch's fetch workers under a bounded concurrency pool, merges
//! the finished batch into the store, and sleeps between batches. Batches
//! are strictly sequential — a batch never starts before the previous one
//! has been persisted, which bounds both memory and the crash-loss window
//! to one batch of work.
//!
//! [`harvest_target`] is the per-target worker: a fixed-delay retry loop
//! around the external fetch, followed by extraction and date
//! normalization. It never raises to the orchestrator; every failure mode
//! is folded into its return value and the error log.

use crate::dates;
use crate::extract::{self, Extraction, RawMedal};
use crate::fetch::FetchPage;
use crate::models::{BatchResult, Medal};
use crate::report::ErrorReporter;
use crate::store::{MedalStore, StoreError};
use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Knobs fixed at process start. See the CLI for defaults.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Targets per batch; the last batch may be shorter.
    pub batch_size: usize,
    /// Upper bound on workers in flight within one batch.
    pub concurrency: usize,
    /// Pause between consecutive batches (never after the last).
    pub inter_batch_delay: Duration,
    /// Fetch attempts per target before giving up.
    pub max_attempts: usize,
    /// Fixed pause between attempts; this is not a backoff.
    pub retry_delay: Duration,
}

/// End-of-run accounting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub medals: usize,
}

/// Harvest one target: fetch with retries, extract, normalize.
///
/// Returns `None` only when every attempt failed (the terminal failure has
/// already been reported); such a target is left out of the batch result
/// entirely so a later resume run will pick it up again. A page whose medal
/// section is absent — or present but empty — is a success with an empty
/// vector.
#[instrument(level = "info", skip_all, fields(%target))]
pub async fn harvest_target<F: FetchPage>(
    fetcher: &F,
    reporter: &ErrorReporter,
    section: &Selector,
    target: &str,
    now: NaiveDateTime,
    max_attempts: usize,
    retry_delay: Duration,
) -> Option<Vec<Medal>> {
    for attempt in 1..=max_attempts {
        info!(attempt, max_attempts, "Scraping target");
        let cause = match fetcher.fetch_page(target).await {
            Ok(body) => {
                let html = Html::parse_document(&body);
                match extract::extract(&html, section) {
                    Ok(Extraction::Records(raw)) => {
                        info!(medals = raw.len(), "Scraped target");
                        return Some(normalize_all(reporter, target, raw, now));
                    }
                    Ok(Extraction::SectionAbsent) => {
                        // The page read fine, it just has no medal section.
                        // Not worth a retry, but worth a diagnostic.
                        warn!("Medal section absent");
                        reporter.report(target, "medal section absent");
                        return Some(Vec::new());
                    }
                    Err(e) => e.to_string(),
                }
            }
            Err(e) => e.to_string(),
        };

        warn!(attempt, max_attempts, error = %cause, "Attempt failed");
        if attempt == max_attempts {
            reporter.report(target, &cause);
            return None;
        }
        sleep(retry_delay).await;
    }
    None
}

/// Normalize each raw medal's date text, falling back to the original text
/// verbatim when the heuristic cannot place it.
fn normalize_all(
    reporter: &ErrorReporter,
    target: &str,
    raw: Vec<RawMedal>,
    now: NaiveDateTime,
) -> Vec<Medal> {
    raw.into_iter()
        .map(|m| {
            let date = match dates::normalize(&m.raw_date, now) {
                Ok(ts) => dates::to_archive_string(ts),
                Err(e) => {
                    warn!(%target, medal = %m.name, text = %e.original, "Date normalization failed");
                    reporter.report(
                        target,
                        &format!("unparseable date for medal {:?}: {:?}", m.name, e.original),
                    );
                    e.original
                }
            };
            Medal { name: m.name, date }
        })
        .collect()
}

/// Run the full harvest over `targets`.
///
/// Already-archived targets are skipped up front; the rest are processed in
/// order, batch by batch, with one store merge per batch.
pub async fn run<F: FetchPage>(
    fetcher: &F,
    store: &mut MedalStore,
    reporter: &ErrorReporter,
    section: &Selector,
    targets: &[String],
    now: NaiveDateTime,
    cfg: &HarvestConfig,
) -> Result<HarvestSummary, StoreError> {
    let completed = store.completed();
    let pending: Vec<&String> = targets
        .iter()
        .filter(|t| !completed.contains(t.as_str()))
        .collect();
    info!(
        total = targets.len(),
        pending = pending.len(),
        skipped = targets.len() - pending.len(),
        "Harvest plan ready"
    );

    let batch_size = cfg.batch_size.max(1);
    let concurrency = cfg.concurrency.max(1);
    let mut summary = HarvestSummary::default();

    for (index, chunk) in pending.chunks(batch_size).enumerate() {
        if index > 0 {
            sleep(cfg.inter_batch_delay).await;
        }
        info!(batch = index + 1, size = chunk.len(), "Starting batch");

        let outcomes: Vec<(String, Option<Vec<Medal>>)> = stream::iter(chunk)
            .map(|target| async move {
                let medals = harvest_target(
                    fetcher,
                    reporter,
                    section,
                    target,
                    now,
                    cfg.max_attempts,
                    cfg.retry_delay,
                )
                .await;
                (target.to_string(), medals)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut batch = BatchResult::new();
        for (target, medals) in outcomes {
            summary.attempted += 1;
            match medals {
                Some(medals) => {
                    summary.succeeded += 1;
                    summary.medals += medals.len();
                    batch.insert(target, medals);
                }
                None => summary.failed += 1,
            }
        }

        store.merge(batch)?;
        info!(batch = index + 1, archived = store.len(), "Batch persisted");
    }

    Ok(summary)
}
