use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::TournamentEntity,
    dto::{
        admin::{
            ActionResponse, AdminMatch, AdminPrediction, CreateMatchRequest,
            DeletedPredictionsResponse, OverrideRequest, OverrideView, SeasonRequest,
            SetResultRequest, UpdateMatchRequest,
        },
        public::SeasonResponse,
    },
    error::AppError,
    scoring::aggregate::RecomputeReport,
    services::{admin_service, leaderboard_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints for managing matches, the prediction log, overrides
/// and snapshots.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/matches", get(list_matches).post(create_match))
        .route(
            "/admin/matches/{key}",
            put(update_match).delete(delete_match),
        )
        .route(
            "/admin/matches/{key}/result",
            put(set_result).delete(unset_result),
        )
        .route("/admin/matches/{key}/archive", post(archive_match))
        .route("/admin/predictions", get(list_predictions))
        .route(
            "/admin/predictions/{user}/{key}",
            delete(delete_predictions),
        )
        .route("/admin/overrides", get(list_overrides))
        .route(
            "/admin/overrides/{user}",
            put(set_override).delete(clear_override),
        )
        .route("/admin/leaderboard/recompute", post(recompute))
        .route("/admin/season", put(set_season))
        .route(
            "/admin/snapshot",
            get(export_snapshot).put(restore_snapshot),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// List every match, open ones first.
#[utoipa::path(
    get,
    path = "/admin/matches",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Open and archived matches", body = [AdminMatch]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminMatch>>, AppError> {
    Ok(Json(admin_service::list_matches(&state).await?))
}

/// Create a new match.
#[utoipa::path(
    post,
    path = "/admin/matches",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match created", body = AdminMatch),
        (status = 400, description = "Invalid match definition")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<AdminMatch>), AppError> {
    payload.validate()?;
    let created = admin_service::create_match(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edit match metadata.
#[utoipa::path(
    put,
    path = "/admin/matches/{key}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("key" = String, Path, description = "Match key")),
    request_body = UpdateMatchRequest,
    responses(
        (status = 200, description = "Match updated", body = AdminMatch),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Path(key): Path<Uuid>,
    Json(payload): Json<UpdateMatchRequest>,
) -> Result<Json<AdminMatch>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::update_match(&state, key, payload).await?))
}

/// Delete a match and every prediction made on it.
#[utoipa::path(
    delete,
    path = "/admin/matches/{key}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("key" = String, Path, description = "Match key")),
    responses(
        (status = 200, description = "Match deleted", body = ActionResponse),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn delete_match(
    State(state): State<SharedState>,
    Path(key): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::delete_match(&state, key).await?))
}

/// Record or correct the final result.
#[utoipa::path(
    put,
    path = "/admin/matches/{key}/result",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("key" = String, Path, description = "Match key")),
    request_body = SetResultRequest,
    responses(
        (status = 200, description = "Result recorded", body = AdminMatch),
        (status = 400, description = "Malformed score or unknown winner"),
        (status = 409, description = "Match is archived")
    )
)]
pub async fn set_result(
    State(state): State<SharedState>,
    Path(key): Path<Uuid>,
    Json(payload): Json<SetResultRequest>,
) -> Result<Json<AdminMatch>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::set_result(&state, key, payload).await?))
}

/// Clear the result of an open match.
#[utoipa::path(
    delete,
    path = "/admin/matches/{key}/result",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("key" = String, Path, description = "Match key")),
    responses(
        (status = 200, description = "Result cleared", body = AdminMatch),
        (status = 409, description = "Match has no result or is archived")
    )
)]
pub async fn unset_result(
    State(state): State<SharedState>,
    Path(key): Path<Uuid>,
) -> Result<Json<AdminMatch>, AppError> {
    Ok(Json(admin_service::unset_result(&state, key).await?))
}

/// Move a finished match into history.
#[utoipa::path(
    post,
    path = "/admin/matches/{key}/archive",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("key" = String, Path, description = "Match key")),
    responses(
        (status = 200, description = "Match archived", body = AdminMatch),
        (status = 409, description = "Match is not final")
    )
)]
pub async fn archive_match(
    State(state): State<SharedState>,
    Path(key): Path<Uuid>,
) -> Result<Json<AdminMatch>, AppError> {
    Ok(Json(admin_service::archive_match(&state, key).await?))
}

/// Raw prediction log.
#[utoipa::path(
    get,
    path = "/admin/predictions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Prediction log in ingestion order", body = [AdminPrediction]))
)]
pub async fn list_predictions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminPrediction>>, AppError> {
    Ok(Json(admin_service::list_predictions(&state).await?))
}

/// Remove all predictions of a user for one match.
#[utoipa::path(
    delete,
    path = "/admin/predictions/{user}/{key}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("user" = String, Path, description = "Participant name"),
    ("key" = String, Path, description = "Match key")),
    responses(
        (status = 200, description = "Predictions removed", body = DeletedPredictionsResponse),
        (status = 404, description = "Nothing to delete")
    )
)]
pub async fn delete_predictions(
    State(state): State<SharedState>,
    Path((user, key)): Path<(String, Uuid)>,
) -> Result<Json<DeletedPredictionsResponse>, AppError> {
    Ok(Json(
        admin_service::delete_predictions(&state, user, key).await?,
    ))
}

/// Stored leaderboard overrides.
#[utoipa::path(
    get,
    path = "/admin/overrides",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Overrides", body = [OverrideView]))
)]
pub async fn list_overrides(
    State(state): State<SharedState>,
) -> Result<Json<Vec<OverrideView>>, AppError> {
    Ok(Json(admin_service::list_overrides(&state).await?))
}

/// Set or replace a user's override.
#[utoipa::path(
    put,
    path = "/admin/overrides/{user}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("user" = String, Path, description = "Participant name")),
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Override saved", body = OverrideView),
        (status = 400, description = "Override sets no field")
    )
)]
pub async fn set_override(
    State(state): State<SharedState>,
    Path(user): Path<String>,
    Json(payload): Json<OverrideRequest>,
) -> Result<Json<OverrideView>, AppError> {
    Ok(Json(admin_service::set_override(&state, user, payload).await?))
}

/// Drop a user's override.
#[utoipa::path(
    delete,
    path = "/admin/overrides/{user}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token"),
    ("user" = String, Path, description = "Participant name")),
    responses(
        (status = 200, description = "Override cleared", body = ActionResponse),
        (status = 404, description = "No override for this user")
    )
)]
pub async fn clear_override(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::clear_override(&state, user).await?))
}

/// Rebuild the leaderboard from scratch.
#[utoipa::path(
    post,
    path = "/admin/leaderboard/recompute",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Recompute report", body = RecomputeReport))
)]
pub async fn recompute(
    State(state): State<SharedState>,
) -> Result<Json<RecomputeReport>, AppError> {
    Ok(Json(leaderboard_service::recompute_now(&state).await?))
}

/// Set or clear the season title.
#[utoipa::path(
    put,
    path = "/admin/season",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    request_body = SeasonRequest,
    responses((status = 200, description = "Season saved", body = SeasonResponse))
)]
pub async fn set_season(
    State(state): State<SharedState>,
    Json(payload): Json<SeasonRequest>,
) -> Result<Json<SeasonResponse>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::set_season(&state, payload).await?))
}

/// Export the whole tournament state.
#[utoipa::path(
    get,
    path = "/admin/snapshot",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Tournament snapshot", body = TournamentEntity))
)]
pub async fn export_snapshot(
    State(state): State<SharedState>,
) -> Result<Json<TournamentEntity>, AppError> {
    Ok(Json(admin_service::export_snapshot(&state).await?))
}

/// Replace the whole tournament state with an exported snapshot.
#[utoipa::path(
    put,
    path = "/admin/snapshot",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    request_body = TournamentEntity,
    responses((status = 200, description = "Snapshot restored", body = RecomputeReport))
)]
pub async fn restore_snapshot(
    State(state): State<SharedState>,
    Json(payload): Json<TournamentEntity>,
) -> Result<Json<RecomputeReport>, AppError> {
    Ok(Json(admin_service::restore_snapshot(&state, payload).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    check_admin_token(state.config().admin_token(), req.headers())?;
    Ok(next.run(req).await)
}

fn check_admin_token(expected: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Err(AppError::Unauthorized(
            "admin API disabled: no admin token configured".into(),
        ));
    };

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided == expected {
        Ok(())
    } else {
        Err(AppError::Unauthorized("invalid admin token".into()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(token: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static(token));
        }
        headers
    }

    #[test]
    fn accepts_matching_token() {
        assert!(check_admin_token(Some("s3cret"), &headers(Some("s3cret"))).is_ok());
    }

    #[test]
    fn rejects_missing_or_wrong_token() {
        assert!(matches!(
            check_admin_token(Some("s3cret"), &headers(None)),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_admin_token(Some("s3cret"), &headers(Some("guess"))),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn unconfigured_token_disables_admin_routes() {
        assert!(matches!(
            check_admin_token(None, &headers(Some("anything"))),
            Err(AppError::Unauthorized(_))
        ));
    }
}
