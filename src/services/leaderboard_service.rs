//! Materialization of the leaderboard of record and read access to it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    dao::models::LeaderboardRowEntity,
    dto::{
        format_system_time,
        public::{LeaderboardResponse, UserPredictionEntry, UserPredictionsResponse},
    },
    error::ServiceError,
    scoring::{
        aggregate::{RecomputeReport, authoritative_predictions},
        leaderboard::{Leaderboard, LeaderboardRow},
        points::evaluate_text,
        recompute,
    },
    services::sse_events,
    state::{SharedState, tournament::Tournament},
};

/// Rebuild the leaderboard from the stored snapshot, persist it, publish it
/// and announce it.
///
/// Callers must already hold the recompute gate.
pub async fn materialize(
    state: &SharedState,
) -> Result<(Arc<Leaderboard>, RecomputeReport), ServiceError> {
    let store = state.store();
    let snapshot: Tournament = store.load_snapshot().await?.into();
    let result = recompute(&snapshot, state.config().scoring());

    let rows: Vec<LeaderboardRowEntity> = result
        .leaderboard
        .rows()
        .iter()
        .cloned()
        .map(Into::into)
        .collect();
    store.save_leaderboard(rows).await.inspect_err(|err| {
        warn!(error = %err, "failed to persist leaderboard; keeping previous table");
    })?;

    let report = result.report;
    let published = state.publish_leaderboard(result.leaderboard).await;
    info!(
        submitted = report.submitted,
        superseded = report.superseded,
        orphaned = report.orphaned,
        unfinished = report.unfinished,
        malformed = report.malformed,
        scored = report.scored,
        users = report.users,
        overrides_applied = report.overrides_applied,
        overrides_dropped = report.overrides_dropped,
        "leaderboard recomputed"
    );
    sse_events::broadcast_leaderboard_updated(state, &published, report);

    Ok((published, report))
}

/// Force a full recompute outside of any mutation.
pub async fn recompute_now(state: &SharedState) -> Result<RecomputeReport, ServiceError> {
    state
        .run_exclusive(move || async move {
            let (_, report) = materialize(state).await?;
            Ok(report)
        })
        .await
}

/// Publish the persisted leaderboard so readers have data before the first
/// recompute finishes.
pub async fn restore_published(state: &SharedState) -> Result<usize, ServiceError> {
    let rows = state.store().load_leaderboard().await?;
    let count = rows.len();
    let leaderboard =
        Leaderboard::from_rows(rows.into_iter().map(LeaderboardRow::from).collect());
    state.publish_leaderboard(leaderboard).await;
    Ok(count)
}

/// Current published leaderboard with rank and medals.
pub async fn get_leaderboard(state: &SharedState) -> LeaderboardResponse {
    let leaderboard = state.leaderboard().await;
    LeaderboardResponse::from(leaderboard.as_ref())
}

/// A participant's authoritative predictions and how each one scored.
pub async fn user_predictions(
    state: &SharedState,
    user: &str,
) -> Result<UserPredictionsResponse, ServiceError> {
    let user = user.trim();
    if user.is_empty() {
        return Err(ServiceError::InvalidInput("user must not be blank".into()));
    }

    let snapshot: Tournament = state.store().load_snapshot().await?.into();
    let comparison = state.config().scoring().exact_comparison;
    let mine = snapshot.predictions.iter().filter(|p| p.user == user);

    let mut latest = authoritative_predictions(mine);
    latest.sort_by_key(|p| (p.submitted_at, p.sequence));

    let predictions = latest
        .into_iter()
        .map(|prediction| {
            let entry = snapshot.catalog.get(&prediction.match_key);
            let (outcome, points) = match entry {
                Some(entry) => {
                    let outcome = evaluate_text(
                        &prediction.predicted_score,
                        prediction.declared_winner,
                        &entry.fixture,
                        comparison,
                    );
                    let points = outcome.award(entry.fixture.golden).points;
                    (outcome.kind(), points)
                }
                None => ("orphaned", 0),
            };
            UserPredictionEntry {
                match_key: prediction.match_key,
                match_name: entry.map(|entry| entry.fixture.display_name()),
                score: prediction.predicted_score.clone(),
                winner: prediction.declared_winner,
                submitted_at: format_system_time(prediction.submitted_at),
                outcome: outcome.to_string(),
                points,
            }
        })
        .collect();

    Ok(UserPredictionsResponse {
        user: user.to_string(),
        predictions,
    })
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{MatchEntity, NewPredictionEntity, OverrideEntity},
            tournament_store::{TournamentStore, memory::MemoryTournamentStore},
        },
        scoring::score::ScoreLine,
        state::AppState,
    };

    fn finished_match(key: Uuid, golden: bool) -> MatchEntity {
        MatchEntity {
            key,
            team_a: "Hilal".into(),
            team_b: "Nassr".into(),
            kickoff: SystemTime::UNIX_EPOCH,
            final_score: Some(ScoreLine {
                team_a: 2,
                team_b: 1,
            }),
            golden,
            declared_winner: None,
            occasion: None,
            round: None,
            completed_at: None,
        }
    }

    fn new_prediction(user: &str, key: Uuid, score: &str, secs: u64) -> NewPredictionEntity {
        NewPredictionEntity {
            user: user.into(),
            match_key: key,
            prediction: score.into(),
            winner: None,
            submitted_at: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    async fn seeded() -> (SharedState, MemoryTournamentStore, Uuid) {
        let store = MemoryTournamentStore::new();
        let key = Uuid::new_v4();
        store.save_match(finished_match(key, false)).await.unwrap();
        store
            .append_prediction(new_prediction("alice", key, "2-1", 1))
            .await
            .unwrap();
        store
            .append_prediction(new_prediction("bob", key, "1-0", 1))
            .await
            .unwrap();
        let state = AppState::new(Arc::new(store.clone()), AppConfig::default());
        (state, store, key)
    }

    #[tokio::test]
    async fn recompute_persists_and_publishes() {
        let (state, store, _) = seeded().await;
        let mut events = state.public_sse().subscribe();

        let report = recompute_now(&state).await.unwrap();
        assert_eq!(report.scored, 2);
        assert_eq!(report.users, 2);

        let persisted = store.load_leaderboard().await.unwrap();
        assert_eq!(persisted[0].user, "alice");
        assert_eq!(persisted[0].points, 3);

        let published = get_leaderboard(&state).await;
        assert_eq!(published.rows[0].medal.as_deref(), Some("🥇"));
        assert_eq!(published.rows[1].user, "bob");

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("leaderboard.updated"));
    }

    #[tokio::test]
    async fn repeated_recompute_is_stable() {
        let (state, store, _) = seeded().await;
        recompute_now(&state).await.unwrap();
        let first = store.load_leaderboard().await.unwrap();
        recompute_now(&state).await.unwrap();
        assert_eq!(store.load_leaderboard().await.unwrap(), first);
    }

    #[tokio::test]
    async fn override_takes_effect_on_next_recompute() {
        let (state, store, _) = seeded().await;
        store
            .save_override(OverrideEntity {
                user: "bob".into(),
                points: Some(40),
                predictions: None,
            })
            .await
            .unwrap();
        recompute_now(&state).await.unwrap();

        let board = state.leaderboard().await;
        assert_eq!(board.rows()[0].user, "bob");
        assert_eq!(board.rows()[0].points, 40);
        assert_eq!(board.rows()[0].outcome, 1);
    }

    #[tokio::test]
    async fn restore_published_reads_persisted_rows() {
        let (state, store, _) = seeded().await;
        store
            .save_leaderboard(vec![LeaderboardRowEntity {
                user: "carol".into(),
                points: 9,
                predictions: 3,
                exact: 3,
                outcome: 0,
            }])
            .await
            .unwrap();
        assert_eq!(restore_published(&state).await.unwrap(), 1);
        assert_eq!(state.leaderboard().await.rows()[0].user, "carol");
    }

    #[tokio::test]
    async fn user_predictions_show_latest_rows_with_outcome() {
        let (state, store, key) = seeded().await;
        store
            .append_prediction(new_prediction("bob", key, "3-1", 5))
            .await
            .unwrap();
        store
            .append_prediction(new_prediction("bob", Uuid::new_v4(), "0-0", 6))
            .await
            .unwrap();

        let response = user_predictions(&state, "bob").await.unwrap();
        assert_eq!(response.predictions.len(), 2);
        let scored = &response.predictions[0];
        assert_eq!(scored.score, "3-1");
        assert_eq!(scored.outcome, "outcome");
        assert_eq!(scored.points, 1);
        assert_eq!(scored.match_name.as_deref(), Some("Hilal vs Nassr"));
        assert_eq!(response.predictions[1].outcome, "orphaned");

        assert!(user_predictions(&state, " ").await.is_err());
    }
}
