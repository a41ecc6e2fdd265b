//! Resolve a (sport, free-text event name) pair to a catalog event.
//!
//! Tiers run from strict to loose and the first hit wins, so a clear exact
//! match is never shadowed by a fuzzy one:
//!
//! 1. exact key on the gender-stripped name
//! 2. exact key on the full name
//! 3. substring containment within the same sport and gender
//! 4. keyword overlap within the same sport and gender
//!
//! No hit means the name is unresolved; callers drop the record.

use serde::Serialize;
use tracing::debug;

use super::normalize::{extract_gender, keywords, normalize_name, normalize_sport, strip_gender_prefix};
use super::{event_key, EventCatalog};
use crate::store::models::{Event, Gender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ExactKey,
    FullName,
    Substring,
    Keyword,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    pub event: &'a Event,
    pub tier: MatchTier,
}

impl EventCatalog {
    /// Resolve a raw event name. `gender_hint` overrides the gender inferred
    /// from the name itself.
    pub fn resolve(
        &self,
        sport: &str,
        raw_name: &str,
        gender_hint: Option<Gender>,
    ) -> Option<MatchOutcome<'_>> {
        let sport = normalize_sport(sport);
        let gender = gender_hint.unwrap_or_else(|| extract_gender(raw_name));
        let stripped = strip_gender_prefix(raw_name);
        if stripped.is_empty() {
            return None;
        }

        let outcome = self
            .by_stripped_key(&event_key(&sport, gender, &stripped))
            .map(|event| MatchOutcome { event, tier: MatchTier::ExactKey })
            .or_else(|| {
                self.by_full_key(&event_key(&sport, gender, &normalize_name(raw_name)))
                    .map(|event| MatchOutcome { event, tier: MatchTier::FullName })
            })
            .or_else(|| {
                self.substring_match(&sport, gender, &stripped)
                    .map(|event| MatchOutcome { event, tier: MatchTier::Substring })
            })
            .or_else(|| {
                self.keyword_match(&sport, gender, &stripped)
                    .map(|event| MatchOutcome { event, tier: MatchTier::Keyword })
            });

        match &outcome {
            Some(m) => debug!("Matched '{}' ({}) → {} via {:?}", raw_name, sport, m.event.id, m.tier),
            None => debug!("Unresolved event name '{}' ({}, {})", raw_name, sport, gender.as_str()),
        }
        outcome
    }

    /// Convenience wrapper returning only the identifier.
    pub fn resolve_id(&self, sport: &str, raw_name: &str, gender_hint: Option<Gender>) -> Option<&str> {
        self.resolve(sport, raw_name, gender_hint)
            .map(|m| m.event.id.as_str())
    }

    fn substring_match(&self, sport: &str, gender: Gender, query: &str) -> Option<&Event> {
        self.group(sport, gender).find(|event| {
            let stored = strip_gender_prefix(&event.name);
            !stored.is_empty() && (query.contains(&stored) || stored.contains(query))
        })
    }

    /// Best keyword overlap; ties go to the earlier catalog entry.
    fn keyword_match(&self, sport: &str, gender: Gender, query: &str) -> Option<&Event> {
        let query_tokens = keywords(query);
        if query_tokens.is_empty() {
            return None;
        }

        let mut best: Option<(&Event, usize)> = None;
        for event in self.group(sport, gender) {
            let stored_tokens = keywords(&strip_gender_prefix(&event.name));
            let overlap = query_tokens
                .iter()
                .filter(|t| stored_tokens.contains(*t))
                .count();
            let accepted = overlap >= 2 || (query_tokens.len() == 1 && overlap == 1);
            if accepted && best.map_or(true, |(_, n)| overlap > n) {
                best = Some((event, overlap));
            }
        }
        best.map(|(event, _)| event)
    }
}
