use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Check the storage backend and report how many rows are published.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let rows = state.leaderboard().await.len();
    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(rows),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::tournament_store::memory::MemoryTournamentStore, state::AppState,
    };

    #[tokio::test]
    async fn memory_store_is_healthy() {
        let state = AppState::new(Arc::new(MemoryTournamentStore::new()), AppConfig::default());
        let status = health_status(&state).await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.leaderboard_rows, 0);
    }
}
