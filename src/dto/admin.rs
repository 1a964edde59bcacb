//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MatchLocation, OverrideEntity, PredictionEntity},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_score_text, validate_timestamp},
    },
    scoring::winner::Winner,
    state::{match_lifecycle::MatchPhase, tournament::Match},
};

/// Payload creating a new match in the open collection.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMatchRequest {
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub team_a: String,
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub team_b: String,
    /// RFC 3339 kick-off time.
    #[validate(custom(function = "validate_timestamp"))]
    pub kickoff: String,
    #[serde(default)]
    pub golden: bool,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub occasion: Option<String>,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub round: Option<String>,
}

/// Partial edit of match metadata; omitted fields are left unchanged and an
/// empty `occasion`/`round` clears it.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateMatchRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub team_a: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub team_b: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_timestamp"))]
    pub kickoff: Option<String>,
    #[serde(default)]
    pub golden: Option<bool>,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub occasion: Option<String>,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub round: Option<String>,
}

/// Final result recorded by the admin.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetResultRequest {
    /// Final score such as `2-1`.
    #[validate(custom(function = "validate_score_text"))]
    pub score: String,
    /// Winner overriding the scoreline (e.g. forfeit or penalties): a team
    /// name, `team_a`, `team_b`, `draw` or `تعادل`.
    #[serde(default)]
    pub winner: Option<String>,
}

/// Season title; omitted or blank clears it.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct SeasonRequest {
    #[serde(default)]
    #[validate(length(max = 120))]
    pub name: Option<String>,
}

/// Admin projection of a match from either collection.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminMatch {
    pub key: Uuid,
    pub name: String,
    pub team_a: String,
    pub team_b: String,
    pub kickoff: String,
    pub golden: bool,
    pub phase: MatchPhase,
    pub location: MatchLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_winner: Option<Winner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<(Match, MatchLocation)> for AdminMatch {
    fn from((fixture, location): (Match, MatchLocation)) -> Self {
        Self {
            key: fixture.key,
            name: fixture.display_name(),
            kickoff: format_system_time(fixture.kickoff),
            golden: fixture.golden,
            phase: MatchPhase::of(fixture.result, location),
            location,
            result: fixture.result.score().map(|score| score.to_string()),
            declared_winner: fixture.declared_winner,
            completed_at: fixture.completed_at.map(format_system_time),
            team_a: fixture.team_a,
            team_b: fixture.team_b,
            occasion: fixture.occasion,
            round: fixture.round,
        }
    }
}

/// Raw row of the prediction log.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPrediction {
    pub user: String,
    pub match_key: Uuid,
    pub score: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    pub submitted_at: String,
    pub sequence: u64,
}

impl From<PredictionEntity> for AdminPrediction {
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

/// Manual correction of a participant's totals.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OverrideRequest {
    /// Points shown instead of the computed ones.
    #[serde(default)]
    pub points: Option<u32>,
    /// Prediction count shown instead of the computed one.
    #[serde(default)]
    pub predictions: Option<u32>,
}

/// Stored override.
#[derive(Debug, Serialize, ToSchema)]
pub struct OverrideView {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions: Option<u32>,
}

impl From<OverrideEntity> for OverrideView {
    fn from(value: OverrideEntity) -> Self {
        Self {
            user: value.user,
            points: value.points,
            predictions: value.predictions,
        }
    }
}

/// Number of prediction rows removed.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedPredictionsResponse {
    pub removed: usize,
}

/// Generic action acknowledgement used by admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}
