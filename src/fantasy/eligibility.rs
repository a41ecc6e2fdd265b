//! Whether a risk selection may still be added or removed.
//!
//! An event locks one way: once live or finished it is locked for everyone.
//! Deadline locks (per-event start time, or one global deadline) apply to
//! players only; commissioners and admins bypass them. Caps are checked
//! separately from the lock and only restrict adding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::EventCatalog;
use crate::store::models::{Event, EventStatus, Participant, Role};

pub const MAX_SELECTIONS_PER_SPORT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DeadlineMode {
    /// Each event locks at its own start time
    PerEvent,
    /// Every event locks at one league-wide deadline
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePolicy {
    PerEvent,
    Global(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    EventLive,
    EventFinished,
    EventStarted,
    GlobalDeadlinePassed,
}

impl std::fmt::Display for LockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LockReason::EventLive => "event is live",
            LockReason::EventFinished => "event is finished",
            LockReason::EventStarted => "event has started",
            LockReason::GlobalDeadlinePassed => "selection deadline has passed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown event {0}")]
    UnknownEvent(String),
    #[error("locked: {0}")]
    Locked(LockReason),
    #[error("already holding a risk selection on this event")]
    AlreadySelected,
    #[error("no risk selection on this event")]
    NotSelected,
    #[error("risk selection cap of {cap} reached")]
    TotalCapReached { cap: u32 },
    #[error("already {max} risk selections in {sport}")]
    SportCapReached { sport: String, max: usize },
}

/// Lock state of one event for one role, ignoring caps.
pub fn lock_reason(
    event: &Event,
    role: Role,
    policy: DeadlinePolicy,
    now: DateTime<Utc>,
) -> Option<LockReason> {
    match event.status {
        EventStatus::Live => return Some(LockReason::EventLive),
        EventStatus::Finished => return Some(LockReason::EventFinished),
        EventStatus::Scheduled => {}
    }
    if role.bypasses_deadlines() {
        return None;
    }
    match policy {
        DeadlinePolicy::PerEvent => event
            .start_time
            .filter(|start| now >= *start)
            .map(|_| LockReason::EventStarted),
        DeadlinePolicy::Global(deadline) => {
            (now >= deadline).then_some(LockReason::GlobalDeadlinePassed)
        }
    }
}

/// Aggregate answer for UI gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub event_id: String,
    pub locked: bool,
    pub lock_reason: Option<LockReason>,
    pub selected: bool,
    pub can_add: bool,
    pub can_remove: bool,
    /// Why adding is refused, when it is
    pub add_blocked_by: Option<String>,
}

/// Validator bound to one league's deadline policy and base cap.
#[derive(Debug, Clone, Copy)]
pub struct SelectionValidator {
    pub policy: DeadlinePolicy,
    pub base_cap: u32,
}

impl SelectionValidator {
    pub fn new(policy: DeadlinePolicy, base_cap: u32) -> Self {
        SelectionValidator { policy, base_cap }
    }

    pub fn check_add(
        &self,
        participant: &Participant,
        catalog: &EventCatalog,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SelectionError> {
        let event = self.unlocked_event(participant, catalog, event_id, now)?;
        if holds(participant, event_id) {
            return Err(SelectionError::AlreadySelected);
        }

        let cap = participant.selection_cap(self.base_cap);
        if participant.risk_selections.len() >= cap as usize {
            return Err(SelectionError::TotalCapReached { cap });
        }

        let same_sport = participant
            .risk_selections
            .iter()
            .filter_map(|id| catalog.get(id))
            .filter(|e| e.sport == event.sport)
            .count();
        if same_sport >= MAX_SELECTIONS_PER_SPORT {
            return Err(SelectionError::SportCapReached {
                sport: event.sport.clone(),
                max: MAX_SELECTIONS_PER_SPORT,
            });
        }
        Ok(())
    }

    /// Removal ignores caps; only the lock matters.
    pub fn check_remove(
        &self,
        participant: &Participant,
        catalog: &EventCatalog,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SelectionError> {
        self.unlocked_event(participant, catalog, event_id, now)?;
        if !holds(participant, event_id) {
            return Err(SelectionError::NotSelected);
        }
        Ok(())
    }

    pub fn evaluate(
        &self,
        participant: &Participant,
        catalog: &EventCatalog,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Eligibility, SelectionError> {
        let event = catalog
            .get(event_id)
            .ok_or_else(|| SelectionError::UnknownEvent(event_id.to_string()))?;
        let reason = lock_reason(event, participant.role, self.policy, now);
        let add = self.check_add(participant, catalog, event_id, now);
        Ok(Eligibility {
            event_id: event_id.to_string(),
            locked: reason.is_some(),
            lock_reason: reason,
            selected: holds(participant, event_id),
            can_add: add.is_ok(),
            can_remove: self.check_remove(participant, catalog, event_id, now).is_ok(),
            add_blocked_by: add.err().map(|e| e.to_string()),
        })
    }

    fn unlocked_event<'c>(
        &self,
        participant: &Participant,
        catalog: &'c EventCatalog,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<&'c Event, SelectionError> {
        let event = catalog
            .get(event_id)
            .ok_or_else(|| SelectionError::UnknownEvent(event_id.to_string()))?;
        match lock_reason(event, participant.role, self.policy, now) {
            Some(reason) => Err(SelectionError::Locked(reason)),
            None => Ok(event),
        }
    }
}

fn holds(participant: &Participant, event_id: &str) -> bool {
    participant.risk_selections.iter().any(|id| id == event_id)
}
