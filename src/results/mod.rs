//! Result reconciliation and the refresh pipeline.
//!
//! Confirmed results are loaded from the store; scraped results come from
//! one best-effort fetch of the external document. The two are merged into
//! a single result per event id.

pub mod parser;
pub mod source;

pub use parser::parse_document;
pub use source::{fetch_best_effort, HttpSource, ResultSource};

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::catalog::EventCatalog;
use crate::store::models::MedalResult;

/// Records below this confidence are never surfaced as new.
pub const NEW_RESULT_MIN_CONFIDENCE: f64 = 0.5;

/// Reconciled results, keyed by event id.
pub type ResultMap = BTreeMap<String, MedalResult>;

/// Merge confirmed and scraped results.
///
/// Confirmed records go in first and scraped records overwrite them by event
/// id. Scraped data is treated as the more current source, so the later
/// source wins regardless of confidence.
pub fn reconcile(confirmed: &[MedalResult], scraped: &[MedalResult]) -> ResultMap {
    let mut merged = ResultMap::new();
    for result in confirmed.iter().chain(scraped) {
        merged.insert(result.event_id.clone(), result.clone());
    }
    merged
}

/// Candidates whose event is not already known and whose confidence is at
/// least [`NEW_RESULT_MIN_CONFIDENCE`].
pub fn diff_new(candidates: &[MedalResult], known: &[MedalResult]) -> Vec<MedalResult> {
    let known_ids: HashSet<&str> = known.iter().map(|r| r.event_id.as_str()).collect();
    candidates
        .iter()
        .filter(|r| !known_ids.contains(r.event_id.as_str()))
        .filter(|r| r.confidence >= NEW_RESULT_MIN_CONFIDENCE)
        .cloned()
        .collect()
}

/// Output of one refresh: everything downstream consumers read.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub results: ResultMap,
    /// Scraped results not present in the confirmed set
    pub new_results: Vec<MedalResult>,
    pub scraped_count: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Fetch the scrape source once, parse it, and reconcile with `confirmed`.
/// With no source, or when the fetch fails, the confirmed set stands alone.
pub async fn refresh(
    catalog: &EventCatalog,
    confirmed: &[MedalResult],
    source: Option<&dyn ResultSource>,
    min_source_len: usize,
) -> Reconciled {
    let fetched_at = Utc::now();
    let document = match source {
        Some(source) => fetch_best_effort(source, min_source_len).await,
        None => None,
    };
    let scraped = document
        .map(|doc| stamp(parse_document(&doc, catalog).results, fetched_at))
        .unwrap_or_default();

    let results = reconcile(confirmed, &scraped);
    let new_results = diff_new(&scraped, confirmed);
    info!(
        "Reconciled {} results ({} confirmed, {} scraped, {} new)",
        results.len(),
        confirmed.len(),
        scraped.len(),
        new_results.len()
    );
    Reconciled {
        results,
        new_results,
        scraped_count: scraped.len(),
        fetched_at,
    }
}

fn stamp(mut results: Vec<MedalResult>, at: DateTime<Utc>) -> Vec<MedalResult> {
    for r in &mut results {
        r.recorded_at.get_or_insert(at);
    }
    results
}
