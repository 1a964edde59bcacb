use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        public::LeaderboardResponse,
        sse::{LeaderboardUpdatedEvent, ServerEvent},
    },
    scoring::{aggregate::RecomputeReport, leaderboard::Leaderboard},
    state::SharedState,
};

const EVENT_LEADERBOARD_UPDATED: &str = "leaderboard.updated";

/// Broadcast the freshly published leaderboard to public subscribers.
pub fn broadcast_leaderboard_updated(
    state: &SharedState,
    leaderboard: &Leaderboard,
    report: RecomputeReport,
) {
    let payload = LeaderboardUpdatedEvent {
        rows: LeaderboardResponse::from(leaderboard).rows,
        report,
    };
    send_public_event(state, EVENT_LEADERBOARD_UPDATED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
