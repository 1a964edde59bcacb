//! Pure scoring of a single prediction against a match.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    score::{ScoreLine, ScoreParseError, parse_score},
    winner::{Winner, picked_winner, real_winner},
};
use crate::state::tournament::{Match, MatchResult};

/// Points for predicting the exact final score.
pub const EXACT_POINTS: u32 = 3;
/// Points for predicting only the right winner (or draw).
pub const OUTCOME_POINTS: u32 = 1;
/// Factor applied to both awards on golden matches.
pub const GOLDEN_MULTIPLIER: u32 = 2;

/// How predicted and final scorelines are compared for an exact hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExactComparison {
    /// `2-1` only matches a final `2-1`.
    #[default]
    Directional,
    /// `1-2` also matches a final `2-1`.
    OrderInsensitive,
}

impl ExactComparison {
    /// Whether `predicted` counts as the exact final score.
    pub fn matches(self, predicted: ScoreLine, actual: ScoreLine) -> bool {
        match self {
            ExactComparison::Directional => predicted == actual,
            ExactComparison::OrderInsensitive => {
                predicted == actual || predicted.mirrored() == actual
            }
        }
    }
}

/// Why a prediction earned what it earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// Final score predicted exactly.
    Exact,
    /// Winner (or draw) predicted, score wrong.
    Outcome,
    /// Neither score nor winner predicted.
    Miss,
    /// Predicted score text could not be parsed.
    Malformed(ScoreParseError),
    /// The match has no final result yet.
    NotFinal,
}

impl ScoreOutcome {
    /// Whether this outcome counts towards a participant's prediction total.
    pub fn is_scored(&self) -> bool {
        matches!(
            self,
            ScoreOutcome::Exact | ScoreOutcome::Outcome | ScoreOutcome::Miss
        )
    }

    /// Convert into an award, applying the golden multiplier.
    pub fn award(&self, golden: bool) -> PointsAward {
        let multiplier = if golden { GOLDEN_MULTIPLIER } else { 1 };
        match self {
            ScoreOutcome::Exact => PointsAward {
                points: EXACT_POINTS * multiplier,
                exact: 1,
                outcome: 0,
            },
            ScoreOutcome::Outcome => PointsAward {
                points: OUTCOME_POINTS * multiplier,
                exact: 0,
                outcome: 1,
            },
            ScoreOutcome::Miss | ScoreOutcome::Malformed(_) | ScoreOutcome::NotFinal => {
                PointsAward::default()
            }
        }
    }

    /// Short machine readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreOutcome::Exact => "exact",
            ScoreOutcome::Outcome => "outcome",
            ScoreOutcome::Miss => "miss",
            ScoreOutcome::Malformed(_) => "malformed",
            ScoreOutcome::NotFinal => "not_final",
        }
    }
}

/// `(points, exact, outcome)` triple credited for one prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointsAward {
    /// Points credited.
    pub points: u32,
    /// 1 when the prediction was exact.
    pub exact: u32,
    /// 1 when only the outcome was right.
    pub outcome: u32,
}

/// Classify a prediction given already-resolved winners.
pub fn classify(
    predicted: ScoreLine,
    actual: ScoreLine,
    picked: Winner,
    real: Winner,
    comparison: ExactComparison,
) -> ScoreOutcome {
    if comparison.matches(predicted, actual) {
        ScoreOutcome::Exact
    } else if picked == real {
        ScoreOutcome::Outcome
    } else {
        ScoreOutcome::Miss
    }
}

/// Score a parsed prediction against a match.
pub fn evaluate(
    predicted: ScoreLine,
    declared: Option<Winner>,
    fixture: &Match,
    comparison: ExactComparison,
) -> ScoreOutcome {
    let MatchResult::Final(actual) = fixture.result else {
        return ScoreOutcome::NotFinal;
    };

    classify(
        predicted,
        actual,
        picked_winner(declared, predicted),
        real_winner(fixture.declared_winner, actual),
        comparison,
    )
}

/// Score raw prediction text against a match; never fails.
pub fn evaluate_text(
    predicted: &str,
    declared: Option<Winner>,
    fixture: &Match,
    comparison: ExactComparison,
) -> ScoreOutcome {
    if !fixture.result.is_final() {
        return ScoreOutcome::NotFinal;
    }
    match parse_score(predicted) {
        Ok(line) => evaluate(line, declared, fixture, comparison),
        Err(err) => ScoreOutcome::Malformed(err),
    }
}
