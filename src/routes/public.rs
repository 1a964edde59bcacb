use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::public::{
        LeaderboardResponse, MatchSummary, PredictionReceipt, SeasonResponse,
        SubmitPredictionRequest, UserPredictionsResponse,
    },
    error::AppError,
    services::{leaderboard_service, prediction_service, public_service},
    state::SharedState,
};

/// Public endpoints: match listing, prediction intake and the leaderboard.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/matches", get(list_matches))
        .route("/public/predictions", post(submit_prediction))
        .route("/public/leaderboard", get(get_leaderboard))
        .route("/public/season", get(get_season))
        .route("/public/users/{user}/predictions", get(get_user_predictions))
}

#[utoipa::path(
    get,
    path = "/public/matches",
    tag = "public",
    responses((status = 200, description = "Open matches ordered by kick-off", body = [MatchSummary]))
)]
/// Return the open matches with their prediction window state.
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    Ok(Json(public_service::list_open_matches(&state).await?))
}

#[utoipa::path(
    post,
    path = "/public/predictions",
    tag = "public",
    request_body = SubmitPredictionRequest,
    responses(
        (status = 201, description = "Prediction accepted", body = PredictionReceipt),
        (status = 400, description = "Malformed score or blank user"),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Predictions are not open for this match")
    )
)]
/// Submit a prediction; a later submission for the same match replaces the
/// earlier one on the leaderboard.
pub async fn submit_prediction(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitPredictionRequest>,
) -> Result<(StatusCode, Json<PredictionReceipt>), AppError> {
    payload.validate()?;
    let receipt = prediction_service::submit_prediction(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    get,
    path = "/public/leaderboard",
    tag = "public",
    responses((status = 200, description = "Published leaderboard", body = LeaderboardResponse))
)]
/// Return the last published leaderboard with ranks and medals.
pub async fn get_leaderboard(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    Json(leaderboard_service::get_leaderboard(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/users/{user}/predictions",
    tag = "public",
    params(("user" = String, Path, description = "Participant name")),
    responses((status = 200, description = "Predictions that count for this user", body = UserPredictionsResponse))
)]
/// Return the predictions that currently count for a user.
pub async fn get_user_predictions(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Result<Json<UserPredictionsResponse>, AppError> {
    Ok(Json(
        leaderboard_service::user_predictions(&state, &user).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/public/season",
    tag = "public",
    responses((status = 200, description = "Season title, if one is set", body = SeasonResponse))
)]
/// Return the season title shown above the leaderboard.
pub async fn get_season(State(state): State<SharedState>) -> Result<Json<SeasonResponse>, AppError> {
    Ok(Json(public_service::get_season(&state).await?))
}
