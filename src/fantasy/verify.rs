//! Audit view of a participant's score.
//!
//! Recomputes the score, flags selection-state problems as warnings and
//! renders a line-by-line formula trace. Warnings are informational only;
//! they never change the computed score.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::eligibility::MAX_SELECTIONS_PER_SPORT;
use super::scoring::{score, Score, ScoreDetail};
use crate::catalog::EventCatalog;
use crate::results::ResultMap;
use crate::store::models::Participant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationWarning {
    EmptyPortfolio,
    SelectionCapExceeded { count: usize, cap: u32 },
    SportCapExceeded { sport: String, count: usize },
}

impl fmt::Display for VerificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationWarning::EmptyPortfolio => write!(f, "portfolio is empty"),
            VerificationWarning::SelectionCapExceeded { count, cap } => {
                write!(f, "{} risk selections exceed the cap of {}", count, cap)
            }
            VerificationWarning::SportCapExceeded { sport, count } => write!(
                f,
                "{} risk selections in {} (max {})",
                count, sport, MAX_SELECTIONS_PER_SPORT
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub participant_id: String,
    pub score: Score,
    pub warnings: Vec<VerificationWarning>,
    pub trace: Vec<String>,
}

pub fn verify(
    participant: &Participant,
    results: &ResultMap,
    catalog: &EventCatalog,
    base_cap: u32,
) -> Verification {
    let portfolio = participant.portfolio_entries();
    let selections = participant.selections();
    let score = score(&portfolio, &selections, results, catalog);

    let mut warnings = Vec::new();
    if portfolio.is_empty() {
        warnings.push(VerificationWarning::EmptyPortfolio);
    }
    let cap = participant.selection_cap(base_cap);
    if selections.len() > cap as usize {
        warnings.push(VerificationWarning::SelectionCapExceeded {
            count: selections.len(),
            cap,
        });
    }
    let mut per_sport: BTreeMap<&str, usize> = BTreeMap::new();
    for sel in &selections {
        if let Some(event) = catalog.get(&sel.event_id) {
            *per_sport.entry(event.sport.as_str()).or_default() += 1;
        }
    }
    for (sport, count) in per_sport {
        if count > MAX_SELECTIONS_PER_SPORT {
            warnings.push(VerificationWarning::SportCapExceeded {
                sport: sport.to_string(),
                count,
            });
        }
    }

    let mut trace: Vec<String> = score.details.iter().map(trace_line).collect();
    trace.push(format!("Total = {}", score.total));

    Verification {
        participant_id: participant.id.clone(),
        score,
        warnings,
        trace,
    }
}

fn trace_line(d: &ScoreDetail) -> String {
    let head = format!("{} {} ({})", d.event_id, d.event_name, d.sport);
    match (&d.medal, &d.country) {
        (Some(tier), Some(country)) => {
            let risk = if d.is_risk_selection {
                format!(" × {} (risk)", d.risk_multiplier)
            } else {
                String::new()
            };
            format!(
                "{}: {} {} = {} × {} (round){} = {}",
                head,
                tier,
                country,
                tier.base_points(),
                d.round_multiplier,
                risk,
                d.points
            )
        }
        _ => format!("{}: risk selection without an owned medal = {}", head, d.points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fantasy::scoring::tests::olympic_catalog;
    use crate::results::reconcile;
    use crate::store::models::{MedalResult, PortfolioEntry, Role};

    fn participant(portfolio: Vec<PortfolioEntry>, picks: &[&str], extensions: u32) -> Participant {
        Participant {
            id: "p1".into(),
            name: "Kari".into(),
            role: Role::Player,
            portfolio,
            draft_order: vec![],
            risk_selections: picks.iter().map(|s| s.to_string()).collect(),
            purchased_extensions: extensions,
        }
    }

    #[test]
    fn test_empty_portfolio_warns_but_scores() {
        let p = participant(vec![], &[], 0);
        let v = verify(&p, &ResultMap::new(), &olympic_catalog(), 5);
        assert_eq!(v.warnings, vec![VerificationWarning::EmptyPortfolio]);
        assert_eq!(v.score.total, 0);
        assert_eq!(v.trace, vec!["Total = 0".to_string()]);
    }

    #[test]
    fn test_cap_and_sport_warnings() {
        let p = participant(
            vec![PortfolioEntry::acquire("NOR", 1, 1)],
            &["E1", "E2", "E3", "E4"],
            1,
        );
        let v = verify(&p, &ResultMap::new(), &olympic_catalog(), 2);
        assert!(v.warnings.contains(&VerificationWarning::SelectionCapExceeded { count: 4, cap: 3 }));
        assert!(!v
            .warnings
            .iter()
            .any(|w| matches!(w, VerificationWarning::SportCapExceeded { .. })));

        let p = participant(
            vec![PortfolioEntry::acquire("NOR", 1, 1)],
            &["E1", "E2", "E1"],
            5,
        );
        let v = verify(&p, &ResultMap::new(), &olympic_catalog(), 5);
        assert_eq!(
            v.warnings,
            vec![VerificationWarning::SportCapExceeded {
                sport: "alpine skiing".into(),
                count: 3
            }]
        );
    }

    #[test]
    fn test_warnings_do_not_change_score() {
        let results = reconcile(&[MedalResult::confirmed("E1", "NOR", "", "")], &[]);
        let p = participant(
            vec![PortfolioEntry::acquire("NOR", 2, 1)],
            &["E1", "E2", "E3"],
            0,
        );
        let v = verify(&p, &results, &olympic_catalog(), 1);
        assert!(!v.warnings.is_empty());
        assert_eq!(v.score.total, 50);
    }

    #[test]
    fn test_trace_lines() {
        let results = reconcile(
            &[
                MedalResult::confirmed("E1", "NOR", "", ""),
                MedalResult::confirmed("E2", "USA", "", ""),
            ],
            &[],
        );
        let p = participant(vec![PortfolioEntry::acquire("NOR", 1, 1)], &["E1", "E2"], 0);
        let v = verify(&p, &results, &olympic_catalog(), 5);
        assert_eq!(
            v.trace,
            vec![
                "E1 Downhill (alpine skiing): Gold NOR = 5 × 1 (round) × 2 (risk) = 10".to_string(),
                "E2 Downhill (alpine skiing): risk selection without an owned medal = -100".to_string(),
                "Total = -90".to_string(),
            ]
        );
    }

    #[test]
    fn test_warning_display() {
        let w = VerificationWarning::SelectionCapExceeded { count: 6, cap: 5 };
        assert_eq!(w.to_string(), "6 risk selections exceed the cap of 5");
    }
}
