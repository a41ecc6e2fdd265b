//! Read-only loaders for the data the external store maintains.
//!
//! The catalog, the hand-kept confirmed results and the league roster are
//! plain JSON files. Nothing here writes back; persistence belongs to the
//! store that produced these files.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

pub mod models;
use models::*;

/// Load the canonical event list.
pub fn load_catalog(path: &Path) -> Result<Vec<Event>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let events = parse_catalog(&raw)
        .with_context(|| format!("Invalid catalog file {}", path.display()))?;
    info!("Catalog loaded: {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Load the confirmed (ground truth) result list.
pub fn load_confirmed(path: &Path) -> Result<Vec<MedalResult>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read confirmed results {}", path.display()))?;
    let results = parse_confirmed(&raw)
        .with_context(|| format!("Invalid confirmed results file {}", path.display()))?;
    info!("Confirmed results loaded: {}", results.len());
    Ok(results)
}

/// Load the league roster.
pub fn load_league(path: &Path) -> Result<League> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read league {}", path.display()))?;
    let league: League = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid league file {}", path.display()))?;
    info!(
        "League '{}' loaded: {} participant(s)",
        league.name,
        league.participants.len()
    );
    Ok(league)
}

pub fn parse_catalog(raw: &str) -> Result<Vec<Event>> {
    let events: Vec<Event> = serde_json::from_str(raw)?;
    for ev in &events {
        if !is_event_id(&ev.id) {
            warn!("Event id '{}' does not follow the SPORT-N format", ev.id);
        }
    }
    Ok(events)
}

pub fn parse_confirmed(raw: &str) -> Result<Vec<MedalResult>> {
    let rows: Vec<ConfirmedRow> = serde_json::from_str(raw)?;
    Ok(rows
        .iter()
        .map(|r| MedalResult::confirmed(&r.event_id, &r.gold, &r.silver, &r.bronze))
        .collect())
}

/// `SPORT-N` with optional trailing lowercase suffix letters.
fn is_event_id(id: &str) -> bool {
    let Some((sport, rest)) = id.split_once('-') else {
        return false;
    };
    let digits = rest.trim_end_matches(|c: char| c.is_ascii_lowercase());
    !sport.is_empty()
        && sport.chars().all(|c| c.is_ascii_uppercase())
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
}
