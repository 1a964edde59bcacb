use std::time::SystemTime;

use crate::{
    dao::models::MatchLocation,
    dto::public::{MatchSummary, SeasonResponse},
    error::ServiceError,
    services::prediction_service::window_state,
    state::{SharedState, tournament::Match},
};

/// Open matches ordered by kick-off, with their prediction window state.
pub async fn list_open_matches(state: &SharedState) -> Result<Vec<MatchSummary>, ServiceError> {
    list_open_matches_at(state, SystemTime::now()).await
}

/// Same as [`list_open_matches`] with an explicit clock.
pub async fn list_open_matches_at(
    state: &SharedState,
    now: SystemTime,
) -> Result<Vec<MatchSummary>, ServiceError> {
    let snapshot = state.store().load_snapshot().await?;
    let window = state.config().prediction_window();

    let mut matches: Vec<Match> = snapshot.matches.into_iter().map(Match::from).collect();
    matches.sort_by(|a, b| a.kickoff.cmp(&b.kickoff).then_with(|| a.key.cmp(&b.key)));

    Ok(matches
        .iter()
        .map(|fixture| {
            MatchSummary::new(
                fixture,
                window_state(fixture, MatchLocation::Open, window, now),
            )
        })
        .collect())
}

/// Season title set by the admin, if any.
pub async fn get_season(state: &SharedState) -> Result<SeasonResponse, ServiceError> {
    let snapshot = state.store().load_snapshot().await?;
    Ok(SeasonResponse {
        season: snapshot.season,
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::MatchEntity,
            tournament_store::{TournamentStore, memory::MemoryTournamentStore},
        },
        dto::public::PredictionWindow,
        state::AppState,
    };

    fn entity(team_a: &str, hours: u64) -> MatchEntity {
        MatchEntity {
            key: Uuid::new_v4(),
            team_a: team_a.into(),
            team_b: "B".into(),
            kickoff: SystemTime::UNIX_EPOCH + Duration::from_secs(hours * 3600),
            final_score: None,
            golden: false,
            declared_winner: None,
            occasion: None,
            round: None,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn lists_open_matches_by_kickoff() {
        let store = MemoryTournamentStore::new();
        let late = entity("late", 50);
        let soon = entity("soon", 11);
        let archived = entity("old", 1);
        let archived_key = archived.key;
        store.save_match(late).await.unwrap();
        store.save_match(soon).await.unwrap();
        store.save_match(archived).await.unwrap();
        store
            .archive_match(archived_key, SystemTime::UNIX_EPOCH)
            .await
            .unwrap();
        let state = AppState::new(Arc::new(store), AppConfig::default());

        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10 * 3600);
        let listed = list_open_matches_at(&state, now).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].team_a, "soon");
        assert_eq!(listed[0].window, PredictionWindow::Open);
        assert_eq!(listed[1].window, PredictionWindow::NotYetOpen);
        assert_eq!(listed[1].name, "late vs B");
    }
}
