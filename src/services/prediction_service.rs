//! Prediction ingestion: window checks, normalization and append.

use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use crate::{
    dao::models::{MatchLocation, NewPredictionEntity},
    dto::public::{PredictionReceipt, PredictionWindow, SubmitPredictionRequest},
    error::ServiceError,
    scoring::{
        score::parse_score,
        winner::{Winner, parse_winner_label},
    },
    state::{SharedState, mutations::run_mutation_with_recompute, tournament::Match},
};

/// Where `fixture` stands relative to its prediction window at `now`.
///
/// The window opens `window` before kick-off and closes at kick-off; matches
/// with a result or in history are always closed.
pub fn window_state(
    fixture: &Match,
    location: MatchLocation,
    window: Duration,
    now: SystemTime,
) -> PredictionWindow {
    if location == MatchLocation::History || fixture.result.is_final() || now >= fixture.kickoff {
        return PredictionWindow::Closed;
    }
    let opens_at = fixture
        .kickoff
        .checked_sub(window)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    if now < opens_at {
        PredictionWindow::NotYetOpen
    } else {
        PredictionWindow::Open
    }
}

/// Accept a prediction submitted now.
pub async fn submit_prediction(
    state: &SharedState,
    request: SubmitPredictionRequest,
) -> Result<PredictionReceipt, ServiceError> {
    submit_prediction_at(state, request, SystemTime::now()).await
}

/// Accept a prediction as if submitted at `now`, then recompute.
pub async fn submit_prediction_at(
    state: &SharedState,
    request: SubmitPredictionRequest,
    now: SystemTime,
) -> Result<PredictionReceipt, ServiceError> {
    let user = request.user.trim().to_string();
    if user.is_empty() {
        return Err(ServiceError::InvalidInput("user must not be blank".into()));
    }
    let score = parse_score(&request.score)?;

    let store = state.store();
    let window = state.config().prediction_window();
    let key = request.match_key;
    let label = request.winner;
    // lookup, window check and append share one hold of the gate
    let stored = run_mutation_with_recompute(state, move || async move {
        let (entity, location) = store
            .find_match(key)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("match {key}")))?;
        let fixture: Match = entity.into();

        match window_state(&fixture, location, window, now) {
            PredictionWindow::Open => {}
            PredictionWindow::NotYetOpen => {
                return Err(ServiceError::InvalidState(format!(
                    "predictions for {} are not open yet",
                    fixture.display_name()
                )));
            }
            PredictionWindow::Closed => {
                return Err(ServiceError::InvalidState(format!(
                    "predictions for {} are closed",
                    fixture.display_name()
                )));
            }
        }

        let winner = if score.is_draw() {
            Some(Winner::Draw)
        } else {
            let label = label.as_deref().unwrap_or_default();
            parse_winner_label(label, &fixture.team_a, &fixture.team_b).unwrap_or_else(|err| {
                debug!(user = %user, error = %err, "ignoring unknown winner label");
                None
            })
        };

        let new = NewPredictionEntity {
            user,
            match_key: fixture.key,
            prediction: score.to_string(),
            winner,
            submitted_at: now,
        };
        Ok(store.append_prediction(new).await?)
    })
    .await?;

    info!(
        user = %stored.user,
        match_key = %stored.match_key,
        sequence = stored.sequence,
        "prediction accepted"
    );
    Ok(stored.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::MatchEntity,
            tournament_store::{TournamentStore, memory::MemoryTournamentStore},
        },
        state::AppState,
    };

    const HOUR: Duration = Duration::from_secs(3600);

    fn kickoff() -> SystemTime {
        SystemTime::UNIX_EPOCH + 100 * HOUR
    }

    async fn setup() -> (SharedState, MemoryTournamentStore, Uuid) {
        let store = MemoryTournamentStore::new();
        let key = Uuid::new_v4();
        store
            .save_match(MatchEntity {
                key,
                team_a: "Hilal".into(),
                team_b: "Nassr".into(),
                kickoff: kickoff(),
                final_score: None,
                golden: false,
                declared_winner: None,
                occasion: None,
                round: None,
                completed_at: None,
            })
            .await
            .unwrap();
        let state = AppState::new(Arc::new(store.clone()), AppConfig::default());
        (state, store, key)
    }

    fn request(key: Uuid, score: &str, winner: Option<&str>) -> SubmitPredictionRequest {
        SubmitPredictionRequest {
            user: " alice ".into(),
            match_key: key,
            score: score.into(),
            winner: winner.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn accepts_prediction_inside_window() {
        let (state, store, key) = setup().await;
        let receipt = submit_prediction_at(
            &state,
            request(key, "٢–١", Some("hilal")),
            kickoff() - HOUR,
        )
        .await
        .unwrap();

        assert_eq!(receipt.user, "alice");
        assert_eq!(receipt.score, "2-1");
        assert_eq!(receipt.winner, Some(Winner::TeamA));
        assert_eq!(store.load_snapshot().await.unwrap().predictions.len(), 1);
    }

    #[tokio::test]
    async fn draw_forces_draw_winner() {
        let (state, _, key) = setup().await;
        let receipt = submit_prediction_at(
            &state,
            request(key, "1-1", Some("Nassr")),
            kickoff() - HOUR,
        )
        .await
        .unwrap();
        assert_eq!(receipt.winner, Some(Winner::Draw));
    }

    #[tokio::test]
    async fn rejects_outside_window() {
        let (state, _, key) = setup().await;
        let early = submit_prediction_at(&state, request(key, "1-0", None), kickoff() - 3 * HOUR)
            .await
            .unwrap_err();
        assert!(matches!(early, ServiceError::InvalidState(_)));

        let late = submit_prediction_at(&state, request(key, "1-0", None), kickoff())
            .await
            .unwrap_err();
        assert!(matches!(late, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn rejects_bad_score_and_unknown_match() {
        let (state, _, key) = setup().await;
        let err = submit_prediction_at(&state, request(key, "25-0", None), kickoff() - HOUR)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = submit_prediction_at(
            &state,
            request(Uuid::new_v4(), "1-0", None),
            kickoff() - HOUR,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_winner_label_is_left_unset() {
        let (state, _, key) = setup().await;
        let receipt = submit_prediction_at(
            &state,
            request(key, "3-0", Some("Ittihad")),
            kickoff() - HOUR,
        )
        .await
        .unwrap();
        assert_eq!(receipt.winner, None);
    }

    #[tokio::test]
    async fn result_recorded_before_kickoff_closes_the_window() {
        let (state, store, key) = setup().await;
        let (mut entity, _) = store.find_match(key).await.unwrap().unwrap();
        entity.final_score = Some(crate::scoring::score::ScoreLine {
            team_a: 1,
            team_b: 0,
        });
        store.save_match(entity).await.unwrap();

        let err = submit_prediction_at(&state, request(key, "1-0", None), kickoff() - HOUR)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert!(store.load_snapshot().await.unwrap().predictions.is_empty());
    }

    #[test]
    fn window_boundaries() {
        let fixture: Match = MatchEntity {
            key: Uuid::new_v4(),
            team_a: "A".into(),
            team_b: "B".into(),
            kickoff: kickoff(),
            final_score: None,
            golden: false,
            declared_winner: None,
            occasion: None,
            round: None,
            completed_at: None,
        }
        .into();
        let open = |now| window_state(&fixture, MatchLocation::Open, 2 * HOUR, now);

        assert_eq!(open(kickoff() - 2 * HOUR), PredictionWindow::Open);
        assert_eq!(
            open(kickoff() - 2 * HOUR - Duration::from_secs(1)),
            PredictionWindow::NotYetOpen
        );
        assert_eq!(open(kickoff()), PredictionWindow::Closed);
        assert_eq!(
            window_state(&fixture, MatchLocation::History, 2 * HOUR, kickoff() - HOUR),
            PredictionWindow::Closed
        );
    }
}
