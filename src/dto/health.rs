use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Rows on the published leaderboard.
    pub leaderboard_rows: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(leaderboard_rows: usize) -> Self {
        Self {
            status: "ok".to_string(),
            leaderboard_rows,
        }
    }

    /// Create a health response indicating storage is failing.
    pub fn degraded(leaderboard_rows: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            leaderboard_rows,
        }
    }
}
