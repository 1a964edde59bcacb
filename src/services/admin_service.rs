//! Admin operations: matches, results, prediction log, overrides and
//! snapshot export/restore. Every mutation ends with a full recompute.

use std::{sync::Arc, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{MatchEntity, MatchLocation, OverrideEntity, TournamentEntity},
        tournament_store::TournamentStore,
    },
    dto::{
        admin::{
            ActionResponse, AdminMatch, AdminPrediction, CreateMatchRequest,
            DeletedPredictionsResponse, OverrideRequest, OverrideView, SeasonRequest,
            SetResultRequest, UpdateMatchRequest,
        },
        parse_timestamp,
        public::SeasonResponse,
    },
    error::ServiceError,
    scoring::{aggregate::RecomputeReport, score::parse_score, winner::parse_winner_label},
    services::leaderboard_service,
    state::{
        SharedState,
        match_lifecycle::{MatchEvent, MatchPhase, next_phase, result_after},
        mutations::run_mutation_with_recompute,
        tournament::{Match, MatchResult},
    },
};

/// Every match, open collection first, each ordered by kick-off.
pub async fn list_matches(state: &SharedState) -> Result<Vec<AdminMatch>, ServiceError> {
    let snapshot = state.store().load_snapshot().await?;
    let mut open: Vec<Match> = snapshot.matches.into_iter().map(Into::into).collect();
    let mut history: Vec<Match> = snapshot.history.into_iter().map(Into::into).collect();
    open.sort_by_key(|m| m.kickoff);
    history.sort_by_key(|m| m.kickoff);

    Ok(open
        .into_iter()
        .map(|m| (m, MatchLocation::Open))
        .chain(history.into_iter().map(|m| (m, MatchLocation::History)))
        .map(AdminMatch::from)
        .collect())
}

/// Create a match in the open collection with a fresh key.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<AdminMatch, ServiceError> {
    let team_a = request.team_a.trim().to_string();
    let team_b = request.team_b.trim().to_string();
    ensure_distinct_teams(&team_a, &team_b)?;

    let fixture = Match {
        key: Uuid::new_v4(),
        team_a,
        team_b,
        kickoff: parse_kickoff(&request.kickoff)?,
        result: MatchResult::NotPlayed,
        golden: request.golden,
        declared_winner: None,
        occasion: non_blank(request.occasion),
        round: non_blank(request.round),
        completed_at: None,
    };

    let store = state.store();
    let entity: MatchEntity = fixture.clone().into();
    run_mutation_with_recompute(state, || async move { Ok(store.save_match(entity).await?) })
        .await?;

    info!(match_key = %fixture.key, name = %fixture.display_name(), "match created");
    Ok((fixture, MatchLocation::Open).into())
}

/// Edit match metadata. The key never changes.
pub async fn update_match(
    state: &SharedState,
    key: Uuid,
    request: UpdateMatchRequest,
) -> Result<AdminMatch, ServiceError> {
    let store = state.store();
    let updated = run_mutation_with_recompute(state, move || async move {
        let (mut fixture, location) = load_match(&store, key).await?;
        if let Some(team_a) = request.team_a {
            fixture.team_a = team_a.trim().to_string();
        }
        if let Some(team_b) = request.team_b {
            fixture.team_b = team_b.trim().to_string();
        }
        ensure_distinct_teams(&fixture.team_a, &fixture.team_b)?;
        if let Some(kickoff) = request.kickoff {
            fixture.kickoff = parse_kickoff(&kickoff)?;
        }
        if let Some(golden) = request.golden {
            fixture.golden = golden;
        }
        if request.occasion.is_some() {
            fixture.occasion = non_blank(request.occasion);
        }
        if request.round.is_some() {
            fixture.round = non_blank(request.round);
        }

        store.save_match(fixture.clone().into()).await?;
        Ok((fixture, location))
    })
    .await?;

    info!(match_key = %key, "match updated");
    Ok(updated.into())
}

/// Delete a match from either collection together with its predictions.
pub async fn delete_match(state: &SharedState, key: Uuid) -> Result<ActionResponse, ServiceError> {
    let store = state.store();
    run_mutation_with_recompute(state, move || async move {
        if store.delete_match(key).await? {
            Ok(())
        } else {
            Err(match_not_found(key))
        }
    })
    .await?;

    info!(match_key = %key, "match deleted");
    Ok(ActionResponse {
        message: format!("match {key} deleted"),
    })
}

/// Record or correct the final result, optionally with a declared winner.
pub async fn set_result(
    state: &SharedState,
    key: Uuid,
    request: SetResultRequest,
) -> Result<AdminMatch, ServiceError> {
    let score = parse_score(&request.score)?;
    let store = state.store();
    let updated = run_mutation_with_recompute(state, move || async move {
        let (mut fixture, location) = load_match(&store, key).await?;
        let declared = match request.winner.as_deref() {
            Some(label) => parse_winner_label(label, &fixture.team_a, &fixture.team_b)?,
            None => None,
        };

        let phase = MatchPhase::of(fixture.result, location);
        let event = MatchEvent::set_result(phase, score);
        next_phase(phase, event)?;
        fixture.result = result_after(fixture.result, event);
        fixture.declared_winner = declared;

        store.save_match(fixture.clone().into()).await?;
        Ok((fixture, location))
    })
    .await?;

    info!(match_key = %key, score = %score, "match result recorded");
    Ok(updated.into())
}

/// Forget the result of a finished open match.
pub async fn unset_result(state: &SharedState, key: Uuid) -> Result<AdminMatch, ServiceError> {
    let store = state.store();
    let updated = run_mutation_with_recompute(state, move || async move {
        let (mut fixture, location) = load_match(&store, key).await?;
        let event = MatchEvent::UnsetResult;
        next_phase(MatchPhase::of(fixture.result, location), event)?;
        fixture.result = result_after(fixture.result, event);
        fixture.declared_winner = None;

        store.save_match(fixture.clone().into()).await?;
        Ok((fixture, location))
    })
    .await?;

    info!(match_key = %key, "match result cleared");
    Ok(updated.into())
}

/// Move a finished match to the historical collection.
pub async fn archive_match(state: &SharedState, key: Uuid) -> Result<AdminMatch, ServiceError> {
    archive_match_at(state, key, SystemTime::now()).await
}

/// Same as [`archive_match`] with an explicit completion time.
pub async fn archive_match_at(
    state: &SharedState,
    key: Uuid,
    now: SystemTime,
) -> Result<AdminMatch, ServiceError> {
    let store = state.store();
    let archived = run_mutation_with_recompute(state, move || async move {
        let (mut fixture, location) = load_match(&store, key).await?;
        next_phase(MatchPhase::of(fixture.result, location), MatchEvent::Archive)?;
        if !store.archive_match(key, now).await? {
            return Err(match_not_found(key));
        }
        fixture.completed_at = Some(now);
        Ok((fixture, MatchLocation::History))
    })
    .await?;

    info!(match_key = %key, "match archived");
    Ok(archived.into())
}

/// Raw prediction log in ingestion order.
pub async fn list_predictions(state: &SharedState) -> Result<Vec<AdminPrediction>, ServiceError> {
    let snapshot = state.store().load_snapshot().await?;
    Ok(snapshot.predictions.into_iter().map(Into::into).collect())
}

/// Delete every row a user submitted for a match.
pub async fn delete_predictions(
    state: &SharedState,
    user: String,
    key: Uuid,
) -> Result<DeletedPredictionsResponse, ServiceError> {
    let user = participant(&user)?;
    let store = state.store();
    let target = user.clone();
    let removed = run_mutation_with_recompute(state, move || async move {
        match store.delete_predictions(target, key).await? {
            0 => Err(ServiceError::NotFound(format!(
                "no predictions for this user on match {key}"
            ))),
            removed => Ok(removed),
        }
    })
    .await?;

    info!(user = %user, match_key = %key, removed, "predictions deleted");
    Ok(DeletedPredictionsResponse { removed })
}

/// All stored overrides.
pub async fn list_overrides(state: &SharedState) -> Result<Vec<OverrideView>, ServiceError> {
    let snapshot = state.store().load_snapshot().await?;
    Ok(snapshot.overrides.into_iter().map(Into::into).collect())
}

/// Insert or replace a user's override.
pub async fn set_override(
    state: &SharedState,
    user: String,
    request: OverrideRequest,
) -> Result<OverrideView, ServiceError> {
    let user = participant(&user)?;
    if request.points.is_none() && request.predictions.is_none() {
        return Err(ServiceError::InvalidInput(
            "an override needs points, predictions or both".into(),
        ));
    }

    let entity = OverrideEntity {
        user,
        points: request.points,
        predictions: request.predictions,
    };
    let store = state.store();
    let saved = entity.clone();
    run_mutation_with_recompute(state, move || async move {
        Ok(store.save_override(saved).await?)
    })
    .await?;

    info!(user = %entity.user, points = ?entity.points, predictions = ?entity.predictions, "override saved");
    Ok(entity.into())
}

/// Remove a user's override so computed values show again.
pub async fn clear_override(state: &SharedState, user: String) -> Result<ActionResponse, ServiceError> {
    let user = participant(&user)?;
    let store = state.store();
    let target = user.clone();
    run_mutation_with_recompute(state, move || async move {
        if store.delete_override(target).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("no override for this user".into()))
        }
    })
    .await?;

    info!(user = %user, "override cleared");
    Ok(ActionResponse {
        message: format!("override for {user} cleared"),
    })
}

/// Set the season title; a blank name clears it. Scores are untouched, so
/// no recompute runs.
pub async fn set_season(
    state: &SharedState,
    request: SeasonRequest,
) -> Result<SeasonResponse, ServiceError> {
    let season = non_blank(request.name);
    let store = state.store();
    let saved = season.clone();
    state
        .run_exclusive(move || async move { store.save_season(saved).await })
        .await?;

    info!(season = ?season, "season updated");
    Ok(SeasonResponse { season })
}

/// Full state as one document.
pub async fn export_snapshot(state: &SharedState) -> Result<TournamentEntity, ServiceError> {
    Ok(state.store().load_snapshot().await?)
}

/// Replace the full state and recompute.
pub async fn restore_snapshot(
    state: &SharedState,
    snapshot: TournamentEntity,
) -> Result<RecomputeReport, ServiceError> {
    let matches = snapshot.matches.len() + snapshot.history.len();
    let predictions = snapshot.predictions.len();
    let store = state.store();
    let report = state
        .run_exclusive(move || async move {
            store.replace_snapshot(snapshot).await?;
            let (_, report) = leaderboard_service::materialize(state).await?;
            Ok::<_, ServiceError>(report)
        })
        .await?;

    info!(matches, predictions, users = report.users, "snapshot restored");
    Ok(report)
}

async fn load_match(
    store: &Arc<dyn TournamentStore>,
    key: Uuid,
) -> Result<(Match, MatchLocation), ServiceError> {
    store
        .find_match(key)
        .await?
        .map(|(entity, location)| (entity.into(), location))
        .ok_or_else(|| match_not_found(key))
}

fn match_not_found(key: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("match {key}"))
}

fn ensure_distinct_teams(team_a: &str, team_b: &str) -> Result<(), ServiceError> {
    if team_a.is_empty() || team_b.is_empty() {
        return Err(ServiceError::InvalidInput("team names must not be blank".into()));
    }
    if team_a.to_lowercase() == team_b.to_lowercase() {
        return Err(ServiceError::InvalidInput(
            "a match needs two different teams".into(),
        ));
    }
    Ok(())
}

fn parse_kickoff(raw: &str) -> Result<SystemTime, ServiceError> {
    parse_timestamp(raw)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid kickoff `{raw}`: {err}")))
}

fn participant(raw: &str) -> Result<String, ServiceError> {
    let user = raw.trim();
    if user.is_empty() {
        return Err(ServiceError::InvalidInput("user must not be blank".into()));
    }
    Ok(user.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
