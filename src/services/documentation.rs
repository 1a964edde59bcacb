use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Matchday Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::public::list_matches,
        crate::routes::public::submit_prediction,
        crate::routes::public::get_leaderboard,
        crate::routes::public::get_user_predictions,
        crate::routes::public::get_season,
        crate::routes::admin::list_matches,
        crate::routes::admin::create_match,
        crate::routes::admin::update_match,
        crate::routes::admin::delete_match,
        crate::routes::admin::set_result,
        crate::routes::admin::unset_result,
        crate::routes::admin::archive_match,
        crate::routes::admin::list_predictions,
        crate::routes::admin::delete_predictions,
        crate::routes::admin::list_overrides,
        crate::routes::admin::set_override,
        crate::routes::admin::clear_override,
        crate::routes::admin::recompute,
        crate::routes::admin::set_season,
        crate::routes::admin::export_snapshot,
        crate::routes::admin::restore_snapshot,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::public::PredictionWindow,
            crate::dto::public::MatchSummary,
            crate::dto::public::SubmitPredictionRequest,
            crate::dto::public::PredictionReceipt,
            crate::dto::public::LeaderboardEntry,
            crate::dto::public::LeaderboardResponse,
            crate::dto::public::UserPredictionEntry,
            crate::dto::public::UserPredictionsResponse,
            crate::dto::public::SeasonResponse,
            crate::dto::admin::CreateMatchRequest,
            crate::dto::admin::UpdateMatchRequest,
            crate::dto::admin::SetResultRequest,
            crate::dto::admin::AdminMatch,
            crate::dto::admin::AdminPrediction,
            crate::dto::admin::OverrideRequest,
            crate::dto::admin::OverrideView,
            crate::dto::admin::DeletedPredictionsResponse,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::SeasonRequest,
            crate::dto::sse::LeaderboardUpdatedEvent,
            crate::dao::models::TournamentEntity,
            crate::dao::models::MatchLocation,
            crate::scoring::ScoringRules,
            crate::scoring::aggregate::RecomputeReport,
            crate::scoring::winner::Winner,
            crate::state::match_lifecycle::MatchPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Matches, predictions and the leaderboard"),
        (name = "admin", description = "Match administration, corrections and snapshots"),
    )
)]
pub struct ApiDoc;
