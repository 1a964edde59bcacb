use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{dao::models::MatchLocation, scoring::score::ScoreLine, state::tournament::MatchResult};

/// Phases a match goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Scheduled or in progress; no result yet.
    NotPlayed,
    /// Result recorded; the match counts towards scoring.
    Final,
    /// Moved to the historical collection; still scored.
    Archived,
}

impl MatchPhase {
    /// Derive the phase from where a match lives and its result.
    pub fn of(result: MatchResult, location: MatchLocation) -> Self {
        match (location, result) {
            (MatchLocation::History, _) => MatchPhase::Archived,
            (MatchLocation::Open, MatchResult::Final(_)) => MatchPhase::Final,
            (MatchLocation::Open, MatchResult::NotPlayed) => MatchPhase::NotPlayed,
        }
    }
}

/// Admin actions that change a match's phase or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// First result for a match that has not been played.
    RecordResult(ScoreLine),
    /// Correct the result of a finished or archived match.
    EditResult(ScoreLine),
    /// Forget the result and reopen the match.
    UnsetResult,
    /// Move a finished match to history.
    Archive,
}

impl MatchEvent {
    /// Pick the result event matching the current phase: record on a fresh
    /// match, edit otherwise.
    pub fn set_result(phase: MatchPhase, score: ScoreLine) -> Self {
        match phase {
            MatchPhase::NotPlayed => MatchEvent::RecordResult(score),
            MatchPhase::Final | MatchPhase::Archived => MatchEvent::EditResult(score),
        }
    }
}

/// Error returned when an event cannot be applied to a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while the match is {from:?}")]
pub struct InvalidTransition {
    /// Phase the match was in.
    pub from: MatchPhase,
    /// Rejected event.
    pub event: MatchEvent,
}

/// Compute the phase reached by applying `event` from `from`.
pub fn next_phase(from: MatchPhase, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
    let next = match (from, event) {
        (MatchPhase::NotPlayed, MatchEvent::RecordResult(_)) => MatchPhase::Final,
        (MatchPhase::Final, MatchEvent::EditResult(_)) => MatchPhase::Final,
        (MatchPhase::Archived, MatchEvent::EditResult(_)) => MatchPhase::Archived,
        (MatchPhase::Final, MatchEvent::UnsetResult) => MatchPhase::NotPlayed,
        (MatchPhase::Final, MatchEvent::Archive) => MatchPhase::Archived,
        (from, event) => return Err(InvalidTransition { from, event }),
    };
    Ok(next)
}

/// Result a match carries once `event` has been applied.
pub fn result_after(current: MatchResult, event: MatchEvent) -> MatchResult {
    match event {
        MatchEvent::RecordResult(score) | MatchEvent::EditResult(score) => {
            MatchResult::Final(score)
        }
        MatchEvent::UnsetResult => MatchResult::NotPlayed,
        MatchEvent::Archive => current,
    }
}
