//! DTO definitions used by the public REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::PredictionEntity,
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_score_text},
    },
    scoring::{
        leaderboard::{Leaderboard, RankedRow},
        winner::Winner,
    },
    state::{match_lifecycle::MatchPhase, tournament::Match},
};

/// Where a match stands relative to its prediction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PredictionWindow {
    /// Too early: the window has not opened yet.
    NotYetOpen,
    /// Predictions are accepted.
    Open,
    /// Kick-off has passed or a result is recorded.
    Closed,
}

/// Public projection of an open match.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    pub key: Uuid,
    /// Display name, `TeamA vs TeamB`.
    pub name: String,
    pub team_a: String,
    pub team_b: String,
    /// RFC 3339 kick-off time.
    pub kickoff: String,
    pub golden: bool,
    pub phase: MatchPhase,
    /// Final score such as `2-1`, once recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_winner: Option<Winner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    pub window: PredictionWindow,
}

impl MatchSummary {
    /// Build the summary of an open match.
    pub fn new(fixture: &Match, window: PredictionWindow) -> Self {
        Self {
            key: fixture.key,
            name: fixture.display_name(),
            team_a: fixture.team_a.clone(),
            team_b: fixture.team_b.clone(),
            kickoff: format_system_time(fixture.kickoff),
            golden: fixture.golden,
            phase: if fixture.result.is_final() {
                MatchPhase::Final
            } else {
                MatchPhase::NotPlayed
            },
            result: fixture.result.score().map(|score| score.to_string()),
            declared_winner: fixture.declared_winner,
            occasion: fixture.occasion.clone(),
            round: fixture.round.clone(),
            window,
        }
    }
}

/// Prediction submitted by a participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitPredictionRequest {
    /// Participant name.
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub user: String,
    pub match_key: Uuid,
    /// Score text such as `2-1`; Arabic-Indic digits and dash variants are accepted.
    #[validate(custom(function = "validate_score_text"))]
    pub score: String,
    /// Winner label: a team name, `team_a`, `team_b`, `draw` or `تعادل`.
    #[serde(default)]
    pub winner: Option<String>,
}

/// Stored prediction as acknowledged to the participant.
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionReceipt {
    pub user: String,
    pub match_key: Uuid,
    /// Normalized score text.
    pub score: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    pub submitted_at: String,
    pub sequence: u64,
}

impl From<PredictionEntity> for PredictionReceipt {
    fn from(value: PredictionEntity) -> Self {
        Self {
            user: value.user,
            match_key: value.match_key,
            score: value.prediction,
            winner: value.winner,
            submitted_at: format_system_time(value.submitted_at),
            sequence: value.sequence,
        }
    }
}

/// A leaderboard row decorated with rank and medal.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medal: Option<String>,
    pub user: String,
    pub points: u32,
    pub predictions: u32,
    pub exact: u32,
    pub outcome: u32,
}

impl From<RankedRow<'_>> for LeaderboardEntry {
    fn from(value: RankedRow<'_>) -> Self {
        Self {
            rank: value.rank,
            medal: value.medal.map(str::to_string),
            user: value.row.user.clone(),
            points: value.row.points,
            predictions: value.row.predictions,
            exact: value.row.exact,
            outcome: value.row.outcome,
        }
    }
}

/// Current season title.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeasonResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

/// Published leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub rows: Vec<LeaderboardEntry>,
}

impl From<&Leaderboard> for LeaderboardResponse {
    fn from(value: &Leaderboard) -> Self {
        Self {
            rows: value.ranked().map(Into::into).collect(),
        }
    }
}

/// A participant's authoritative prediction on one match and how it scored.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPredictionEntry {
    pub match_key: Uuid,
    /// Display name, absent when the match no longer exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_name: Option<String>,
    pub score: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    pub submitted_at: String,
    /// `exact`, `outcome`, `miss`, `malformed`, `not_final` or `orphaned`.
    pub outcome: String,
    pub points: u32,
}

/// All authoritative predictions of a participant.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPredictionsResponse {
    pub user: String,
    pub predictions: Vec<UserPredictionEntry>,
}
