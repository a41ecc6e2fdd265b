use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::catalog::EventCatalog;
use crate::fantasy::{verify, Verification};
use crate::results::{Reconciled, ResultMap};
use crate::store::models::{League, MedalResult};

/// One row of the league table
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub participant_id: String,
    pub name: String,
    pub total: i64,
    pub warnings: usize,
}

/// Everything the consumers of one refresh read.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub results: ResultMap,
    pub new_results: Vec<MedalResult>,
    pub scraped_count: usize,
    pub standings: Vec<Standing>,
    /// participant id → verified score
    pub verifications: BTreeMap<String, Verification>,
}

pub fn build(
    league: &League,
    catalog: &EventCatalog,
    reconciled: Reconciled,
    base_cap: u32,
) -> Snapshot {
    let mut verifications = BTreeMap::new();
    for participant in &league.participants {
        let v = verify(participant, &reconciled.results, catalog, base_cap);
        for w in &v.warnings {
            warn!("{} ({}): {}", participant.name, participant.id, w);
        }
        verifications.insert(participant.id.clone(), v);
    }

    let mut standings: Vec<Standing> = league
        .participants
        .iter()
        .filter_map(|p| {
            verifications.get(&p.id).map(|v| Standing {
                rank: 0,
                participant_id: p.id.clone(),
                name: p.name.clone(),
                total: v.score.total,
                warnings: v.warnings.len(),
            })
        })
        .collect();
    // Highest total first; ties keep roster order and share a rank
    standings.sort_by(|a, b| b.total.cmp(&a.total));
    let mut prev: Option<(i64, usize)> = None;
    for (i, s) in standings.iter_mut().enumerate() {
        s.rank = match prev {
            Some((total, rank)) if total == s.total => rank,
            _ => i + 1,
        };
        prev = Some((s.total, s.rank));
    }

    if let Some(leader) = standings.first() {
        info!("Leader: {} with {} points", leader.name, leader.total);
    }

    Snapshot {
        generated_at: reconciled.fetched_at,
        results: reconciled.results,
        new_results: reconciled.new_results,
        scraped_count: reconciled.scraped_count,
        standings,
        verifications,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fantasy::scoring::tests::olympic_catalog;
    use crate::results::reconcile;
    use crate::store::models::{Participant, Role};

    fn member(id: &str, draft: &[&str], picks: &[&str]) -> Participant {
        Participant {
            id: id.into(),
            name: id.to_uppercase(),
            role: Role::Player,
            portfolio: vec![],
            draft_order: draft.iter().map(|s| s.to_string()).collect(),
            risk_selections: picks.iter().map(|s| s.to_string()).collect(),
            purchased_extensions: 0,
        }
    }

    #[test]
    fn test_standings_ranked_with_ties() {
        let league = League {
            name: "Test".into(),
            participants: vec![
                member("a", &["SUI"], &[]),
                member("b", &["NOR"], &[]),
                member("c", &["AUT"], &[]),
            ],
        };
        let confirmed = vec![
            MedalResult::confirmed("E1", "NOR", "SUI", "AUT"),
            MedalResult::confirmed("E2", "SUI", "AUT", "ITA"),
        ];
        let reconciled = Reconciled {
            results: reconcile(&confirmed, &[]),
            new_results: vec![],
            scraped_count: 0,
            fetched_at: Utc::now(),
        };
        let snap = build(&league, &olympic_catalog(), reconciled, 5);
        // a: 3 + 5 = 8, b: 5, c: 1 + 3 = 4
        let order: Vec<(&str, usize, i64)> = snap
            .standings
            .iter()
            .map(|s| (s.participant_id.as_str(), s.rank, s.total))
            .collect();
        assert_eq!(order, vec![("a", 1, 8), ("b", 2, 5), ("c", 3, 4)]);
        assert_eq!(snap.verifications.len(), 3);
    }

    #[test]
    fn test_equal_totals_share_rank() {
        let league = League {
            name: "Test".into(),
            participants: vec![member("a", &[], &[]), member("b", &[], &[])],
        };
        let reconciled = Reconciled {
            results: ResultMap::new(),
            new_results: vec![],
            scraped_count: 0,
            fetched_at: Utc::now(),
        };
        let snap = build(&league, &olympic_catalog(), reconciled, 5);
        assert!(snap.standings.iter().all(|s| s.rank == 1));
        assert_eq!(snap.standings[0].warnings, 1);
    }
}
