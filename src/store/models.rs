use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gender / category of a competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
    Mixed,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
            Gender::Mixed => "mixed",
        }
    }
}

/// Lifecycle of an event. Transitions are driven by the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
}

/// One competition in the canonical catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Stable identifier, `SPORT-N` with optional suffix letters (e.g. "ALP-3", "BIA-7b")
    pub id: String,
    pub sport: String,
    pub name: String,
    pub gender: Gender,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Confirmed,
    Scraped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedalTier {
    Gold,
    Silver,
    Bronze,
}

impl MedalTier {
    pub const ALL: [MedalTier; 3] = [MedalTier::Gold, MedalTier::Silver, MedalTier::Bronze];

    /// Base fantasy points before any multiplier.
    pub fn base_points(&self) -> i64 {
        match self {
            MedalTier::Gold => 5,
            MedalTier::Silver => 3,
            MedalTier::Bronze => 1,
        }
    }
}

impl std::fmt::Display for MedalTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MedalTier::Gold => "Gold",
            MedalTier::Silver => "Silver",
            MedalTier::Bronze => "Bronze",
        };
        f.write_str(s)
    }
}

/// Podium outcome for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedalResult {
    pub event_id: String,
    /// Country codes (IOC), each unknown until decided
    pub gold: Option<String>,
    pub silver: Option<String>,
    pub bronze: Option<String>,
    pub provenance: Provenance,
    /// Trust in the record, 0.0–1.0
    pub confidence: f64,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl MedalResult {
    pub fn confirmed(event_id: &str, gold: &str, silver: &str, bronze: &str) -> Self {
        let slot = |c: &str| (!c.is_empty()).then(|| c.to_string());
        MedalResult {
            event_id: event_id.to_string(),
            gold: slot(gold),
            silver: slot(silver),
            bronze: slot(bronze),
            provenance: Provenance::Confirmed,
            confidence: 1.0,
            recorded_at: None,
        }
    }

    pub fn medalist(&self, tier: MedalTier) -> Option<&str> {
        match tier {
            MedalTier::Gold => self.gold.as_deref(),
            MedalTier::Silver => self.silver.as_deref(),
            MedalTier::Bronze => self.bronze.as_deref(),
        }
    }

    /// True once at least one podium slot is known.
    pub fn is_decided(&self) -> bool {
        MedalTier::ALL.iter().any(|t| self.medalist(*t).is_some())
    }
}

/// A hand-maintained ground-truth row as stored in the confirmed results file.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmedRow {
    pub event_id: String,
    #[serde(default)]
    pub gold: String,
    #[serde(default)]
    pub silver: String,
    #[serde(default)]
    pub bronze: String,
}

/// A drafted country in a participant's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub country: String,
    /// Draft round, 1–4
    pub round: u8,
    /// Fixed at acquisition; never recomputed
    pub multiplier: i64,
    pub sequence: u32,
}

impl PortfolioEntry {
    /// Record an acquisition, fixing the multiplier from the round.
    pub fn acquire(country: &str, round: u8, sequence: u32) -> Self {
        PortfolioEntry {
            country: country.to_string(),
            round,
            multiplier: round_multiplier(round),
            sequence,
        }
    }
}

/// Medal-point multiplier for the draft round a country was acquired in.
pub fn round_multiplier(round: u8) -> i64 {
    match round {
        0 | 1 => 1,
        2 => 5,
        3 => 10,
        _ => 20,
    }
}

/// Participant role, relevant only to deadline locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Player,
    Commissioner,
    Admin,
}

impl Role {
    /// Privileged roles skip deadline locks. Lifecycle locks still apply.
    pub fn bypasses_deadlines(&self) -> bool {
        matches!(self, Role::Commissioner | Role::Admin)
    }
}

/// A doubled-stakes pick ("confidence pick") on one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSelection {
    pub participant_id: String,
    pub event_id: String,
}

/// League member as supplied by the external store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Detailed acquisition records; preferred when present
    #[serde(default)]
    pub portfolio: Vec<PortfolioEntry>,
    /// Country codes in the order they were drafted, used when `portfolio` is empty
    #[serde(default)]
    pub draft_order: Vec<String>,
    /// Event ids of the participant's risk selections
    #[serde(default)]
    pub risk_selections: Vec<String>,
    #[serde(default)]
    pub purchased_extensions: u32,
}

impl Participant {
    /// Portfolio entries, derived from draft order when no detailed data exists.
    pub fn portfolio_entries(&self) -> Vec<PortfolioEntry> {
        if !self.portfolio.is_empty() {
            return self.portfolio.clone();
        }
        self.draft_order
            .iter()
            .enumerate()
            .map(|(i, country)| {
                let round = (i + 1).min(4) as u8;
                PortfolioEntry::acquire(country, round, i as u32 + 1)
            })
            .collect()
    }

    pub fn selections(&self) -> Vec<RiskSelection> {
        self.risk_selections
            .iter()
            .map(|event_id| RiskSelection {
                participant_id: self.id.clone(),
                event_id: event_id.clone(),
            })
            .collect()
    }

    pub fn selection_cap(&self, base_cap: u32) -> u32 {
        base_cap + self.purchased_extensions
    }
}

/// Roster file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct League {
    pub name: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_multiplier_monotonic_and_capped() {
        let values: Vec<i64> = (1..=8).map(round_multiplier).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values, vec![1, 5, 10, 20, 20, 20, 20, 20]);
    }

    #[test]
    fn test_portfolio_from_draft_order_clamps_round() {
        let p = Participant {
            id: "p1".into(),
            name: "Kari".into(),
            role: Role::Player,
            portfolio: vec![],
            draft_order: vec!["NOR".into(), "ITA".into(), "USA".into(), "GER".into(), "CAN".into()],
            risk_selections: vec![],
            purchased_extensions: 0,
        };
        let entries = p.portfolio_entries();
        let rounds: Vec<u8> = entries.iter().map(|e| e.round).collect();
        assert_eq!(rounds, vec![1, 2, 3, 4, 4]);
        assert_eq!(entries[4].multiplier, 20);
        assert_eq!(entries[0].sequence, 1);
    }

    #[test]
    fn test_detailed_portfolio_preferred() {
        let p = Participant {
            id: "p1".into(),
            name: "Kari".into(),
            role: Role::Player,
            portfolio: vec![PortfolioEntry::acquire("ITA", 3, 1)],
            draft_order: vec!["NOR".into()],
            risk_selections: vec![],
            purchased_extensions: 0,
        };
        let entries = p.portfolio_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].country, "ITA");
        assert_eq!(entries[0].multiplier, 10);
    }

    #[test]
    fn test_only_privileged_roles_bypass_deadlines() {
        assert!(!Role::Player.bypasses_deadlines());
        assert!(Role::Commissioner.bypasses_deadlines());
        assert!(Role::Admin.bypasses_deadlines());
    }

    #[test]
    fn test_gender_serde_lowercase() {
        let g: Gender = serde_json::from_str("\"women\"").unwrap();
        assert_eq!(g, Gender::Women);
        assert_eq!(serde_json::to_string(&EventStatus::Live).unwrap(), "\"live\"");
    }
}
