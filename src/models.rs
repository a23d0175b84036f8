//! Data models for harvested medals.
//!
//! This module defines the core data structures shared across the pipeline:
//! - [`Medal`]: a single earned medal with its name and date field
//! - [`BatchResult`]: the per-batch mapping of target → medal sequence
//!   collected by the orchestrator before it is merged into the store
//!
//! The serialized field names are capitalized (`Name`, `Date`) to match the
//! archive document format, hence the `serde(rename = ...)` attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One earned medal as it appears in the archive document.
///
/// The `date` field is a string on purpose: when the page's relative date
/// text normalizes cleanly it holds an ISO-8601 local timestamp
/// (`%Y-%m-%dT%H:%M:%S`); when normalization fails it holds the raw text
/// verbatim so the record is never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medal {
    /// The medal name as rendered on the member page.
    #[serde(rename = "Name")]
    pub name: String,
    /// ISO-8601 timestamp, or the original date text when unparseable.
    #[serde(rename = "Date")]
    pub date: String,
}

/// Per-batch harvest outcome, keyed by target identifier.
///
/// Medal order within each target's vector follows the document order of the
/// fetched page and is never reordered or deduplicated. Targets that
/// exhausted every fetch attempt are absent from the map entirely; targets
/// whose page lacked the medal section (or had zero medals) are present with
/// an empty vector.
pub type BatchResult = BTreeMap<String, Vec<Medal>>;
