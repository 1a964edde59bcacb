use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::public::LeaderboardEntry, scoring::aggregate::RecomputeReport};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Raw data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already encoded data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after every recompute with the freshly published table.
pub struct LeaderboardUpdatedEvent {
    pub rows: Vec<LeaderboardEntry>,
    pub report: RecomputeReport,
}
