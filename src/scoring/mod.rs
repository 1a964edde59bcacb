//! Scoring and leaderboard materialization.
//!
//! Everything in here is pure: a [`Tournament`] snapshot goes in, a sorted
//! [`Leaderboard`] and a [`RecomputeReport`] come out. Persistence and
//! publication live in the service layer.

pub mod aggregate;
pub mod leaderboard;
pub mod points;
pub mod score;
pub mod winner;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::tournament::Tournament;
use aggregate::{RecomputeReport, aggregate};
use leaderboard::{Leaderboard, merge_overrides};
use points::ExactComparison;

/// Tunable rules of the scoring engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScoringRules {
    /// How exact hits are detected.
    #[serde(default)]
    pub exact_comparison: ExactComparison,
    /// Whether overrides create rows for users without scored predictions.
    #[serde(default)]
    pub include_override_only_users: bool,
}

/// Output of a full recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomputation {
    /// The new leaderboard of record.
    pub leaderboard: Leaderboard,
    /// What happened along the way.
    pub report: RecomputeReport,
}

/// Rebuild the leaderboard from scratch.
pub fn recompute(tournament: &Tournament, rules: &ScoringRules) -> Recomputation {
    let aggregation = aggregate(
        &tournament.predictions,
        &tournament.catalog,
        rules.exact_comparison,
    );
    let mut report = aggregation.report;
    let rows = merge_overrides(
        aggregation.totals,
        &tournament.overrides,
        rules.include_override_only_users,
        &mut report,
    );
    let leaderboard = Leaderboard::from_rows(rows);
    report.users = leaderboard.len();

    Recomputation {
        leaderboard,
        report,
    }
}
