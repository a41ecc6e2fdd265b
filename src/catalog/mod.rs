//! Canonical event catalog.
//!
//! Built once at startup from the store's event list and passed by reference
//! to everything that needs it. Events are indexed by two exact keys
//! (`sport|gender|name`): one with leading gender words stripped and one
//! with the full name, plus a per-(sport, gender) list for the fuzzy tiers
//! of the matcher.

pub mod matcher;
pub mod normalize;

pub use matcher::{MatchOutcome, MatchTier};

use std::collections::HashMap;
use tracing::debug;

use crate::store::models::{Event, Gender};
use normalize::{normalize_name, normalize_sport, strip_gender_prefix};

/// Read-only event catalog with lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    /// Catalog order is preserved; fuzzy tiers break ties by it
    events: Vec<Event>,
    by_id: HashMap<String, usize>,
    /// `sport|gender|stripped name` → indexes; more than one means the key is ambiguous
    stripped_keys: HashMap<String, Vec<usize>>,
    /// `sport|gender|full name` → index
    full_keys: HashMap<String, usize>,
    /// (sport, gender) → indexes in catalog order
    groups: HashMap<(String, Gender), Vec<usize>>,
}

impl EventCatalog {
    pub fn new(events: Vec<Event>) -> Self {
        let mut catalog = EventCatalog::default();
        for mut event in events {
            event.sport = normalize_sport(&event.sport);
            let idx = catalog.events.len();
            if catalog.by_id.contains_key(&event.id) {
                debug!("Duplicate event id {} ignored", event.id);
                continue;
            }
            catalog.by_id.insert(event.id.clone(), idx);
            catalog
                .stripped_keys
                .entry(event_key(&event.sport, event.gender, &strip_gender_prefix(&event.name)))
                .or_default()
                .push(idx);
            // First definition of a full name wins, like the id index
            catalog
                .full_keys
                .entry(event_key(&event.sport, event.gender, &normalize_name(&event.name)))
                .or_insert(idx);
            catalog
                .groups
                .entry((event.sport.clone(), event.gender))
                .or_default()
                .push(idx);
            catalog.events.push(event);
        }
        debug!(
            "EventCatalog: {} events, {} sport/gender groups",
            catalog.events.len(),
            catalog.groups.len()
        );
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.by_id.get(id).map(|&i| &self.events[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any event belongs to this (already normalized) sport key.
    pub fn has_sport(&self, sport: &str) -> bool {
        self.groups.keys().any(|(s, _)| s == sport)
    }

    /// Only an unambiguous stripped key resolves.
    fn by_stripped_key(&self, key: &str) -> Option<&Event> {
        match self.stripped_keys.get(key).map(Vec::as_slice) {
            Some([i]) => Some(&self.events[*i]),
            _ => None,
        }
    }

    fn by_full_key(&self, key: &str) -> Option<&Event> {
        self.full_keys.get(key).map(|&i| &self.events[i])
    }

    fn group(&self, sport: &str, gender: Gender) -> impl Iterator<Item = &Event> {
        self.groups
            .get(&(sport.to_string(), gender))
            .into_iter()
            .flatten()
            .map(move |&i| &self.events[i])
    }
}

pub(crate) fn event_key(sport: &str, gender: Gender, name: &str) -> String {
    format!("{}|{}|{}", sport, gender.as_str(), name)
}
