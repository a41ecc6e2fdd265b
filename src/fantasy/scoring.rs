//! Deterministic fantasy scoring.
//!
//! For every reconciled result whose event is in the catalog:
//!
//!   points = base(tier) × round multiplier × (2 if risk selection else 1)
//!
//! with base gold = 5, silver = 3, bronze = 1, for each podium slot held by
//! an owned country. A risk selection with no owned medalist costs a flat
//! −100, never scaled.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::EventCatalog;
use crate::results::ResultMap;
use crate::store::models::{Event, MedalResult, MedalTier, PortfolioEntry, RiskSelection};

pub const RISK_MULTIPLIER: i64 = 2;
pub const RISK_PENALTY: i64 = -100;

/// One computed line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDetail {
    pub event_id: String,
    pub event_name: String,
    pub sport: String,
    pub points: i64,
    /// `None` on penalty lines
    pub medal: Option<MedalTier>,
    pub round_multiplier: i64,
    pub risk_multiplier: i64,
    pub is_risk_selection: bool,
    pub is_penalty: bool,
    pub country: Option<String>,
}

impl ScoreDetail {
    /// Share of the points owed to the ×2 risk factor alone.
    pub fn risk_bonus(&self) -> i64 {
        if self.is_penalty || self.risk_multiplier <= 1 {
            0
        } else {
            self.points / 2
        }
    }
}

/// Aggregate view over a participant's score lines. Derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub medal_points: i64,
    pub risk_bonus: i64,
    pub penalty_points: i64,
    pub penalty_count: u32,
    pub by_country: BTreeMap<String, i64>,
    pub by_sport: BTreeMap<String, i64>,
}

impl ScoreBreakdown {
    pub fn from_details(details: &[ScoreDetail]) -> Self {
        let mut b = ScoreBreakdown::default();
        for d in details {
            *b.by_sport.entry(d.sport.clone()).or_default() += d.points;
            if d.is_penalty {
                b.penalty_points += d.points;
                b.penalty_count += 1;
                continue;
            }
            match d.medal {
                Some(MedalTier::Gold) => b.gold += 1,
                Some(MedalTier::Silver) => b.silver += 1,
                Some(MedalTier::Bronze) => b.bronze += 1,
                None => {}
            }
            b.medal_points += d.points;
            b.risk_bonus += d.risk_bonus();
            if let Some(country) = &d.country {
                *b.by_country.entry(country.clone()).or_default() += d.points;
            }
        }
        b
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Score {
    pub total: i64,
    pub details: Vec<ScoreDetail>,
    pub breakdown: ScoreBreakdown,
}

/// Score a portfolio against reconciled results. Missing data scores zero.
pub fn score(
    portfolio: &[PortfolioEntry],
    selections: &[RiskSelection],
    results: &ResultMap,
    catalog: &EventCatalog,
) -> Score {
    let mut owned: HashMap<&str, &PortfolioEntry> = HashMap::new();
    for entry in portfolio {
        owned.entry(entry.country.as_str()).or_insert(entry);
    }
    let risky: HashSet<&str> = selections.iter().map(|s| s.event_id.as_str()).collect();

    let mut details = Vec::new();
    for (event_id, result) in results {
        let Some(event) = catalog.get(event_id) else {
            continue;
        };
        details.extend(score_event(event, result, &owned, risky.contains(event_id.as_str())));
    }

    let total = details.iter().map(|d| d.points).sum();
    let breakdown = ScoreBreakdown::from_details(&details);
    Score {
        total,
        details,
        breakdown,
    }
}

fn score_event(
    event: &Event,
    result: &MedalResult,
    owned: &HashMap<&str, &PortfolioEntry>,
    is_risk: bool,
) -> Vec<ScoreDetail> {
    // Nothing decided yet: no medal lines, and no penalty either
    if !result.is_decided() {
        return Vec::new();
    }
    let risk_multiplier = if is_risk { RISK_MULTIPLIER } else { 1 };

    let mut lines: Vec<ScoreDetail> = MedalTier::ALL
        .iter()
        .filter_map(|&tier| {
            let country = result.medalist(tier)?;
            let entry = owned.get(country)?;
            Some(ScoreDetail {
                event_id: event.id.clone(),
                event_name: event.name.clone(),
                sport: event.sport.clone(),
                points: tier.base_points() * entry.multiplier * risk_multiplier,
                medal: Some(tier),
                round_multiplier: entry.multiplier,
                risk_multiplier,
                is_risk_selection: is_risk,
                is_penalty: false,
                country: Some(entry.country.clone()),
            })
        })
        .collect();

    if is_risk && lines.is_empty() {
        lines.push(ScoreDetail {
            event_id: event.id.clone(),
            event_name: event.name.clone(),
            sport: event.sport.clone(),
            points: RISK_PENALTY,
            medal: None,
            round_multiplier: 1,
            risk_multiplier: 1,
            is_risk_selection: true,
            is_penalty: true,
            country: None,
        });
    }
    lines
}
