//! Command-line interface definitions for the medal harvester.
//!
//! All of the engine's knobs are fixed at process start: paths, batch
//! shape, concurrency bound, retry policy, and fresh-vs-resume mode.

use crate::harvest::HarvestConfig;
use crate::store::StoreMode;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the medal harvester.
///
/// # Examples
///
/// ```sh
/// # Resume (default) an interrupted harvest
/// medal_harvest -i usernames.txt -o all_users_medals.json
///
/// # Start over, gentler on the remote end
/// medal_harvest --fresh --concurrency 4 --inter-batch-delay 10
/// ```
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Line-delimited list of member names to harvest
    #[arg(short, long, default_value = "usernames.txt")]
    pub input: PathBuf,

    /// Path of the JSON medal archive
    #[arg(short, long, default_value = "all_users_medals.json")]
    pub output: PathBuf,

    /// Path of the append-only error log
    #[arg(long, default_value = "error_log.txt")]
    pub error_log: PathBuf,

    /// Discard any existing archive instead of resuming it
    #[arg(long)]
    pub fresh: bool,

    /// Members per batch; the archive is persisted after every batch
    #[arg(long, default_value_t = 25)]
    pub batch_size: usize,

    /// Concurrent fetches within a batch
    #[arg(long, default_value_t = 10)]
    pub concurrency: usize,

    /// Seconds to pause between batches
    #[arg(long, default_value_t = 2)]
    pub inter_batch_delay: u64,

    /// Fetch attempts per member before giving up
    #[arg(long, default_value_t = 3)]
    pub retries: usize,

    /// Seconds to pause between failed attempts
    #[arg(long, default_value_t = 5)]
    pub retry_delay: u64,

    /// Base URL of the member profile service
    #[arg(long, default_value = "https://www.byond.com/members")]
    pub base_url: String,

    /// CSS selector for the medal section of a member page
    #[arg(long, default_value = "#medals")]
    pub section: String,
}

impl Cli {
    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            inter_batch_delay: Duration::from_secs(self.inter_batch_delay),
            max_attempts: self.retries,
            retry_delay: Duration::from_secs(self.retry_delay),
        }
    }

    pub fn store_mode(&self) -> StoreMode {
        if self.fresh {
            StoreMode::Fresh
        } else {
            StoreMode::Resume
        }
    }
}
