pub mod file;
pub mod memory;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        LeaderboardRowEntity, MatchEntity, MatchLocation, NewPredictionEntity, OverrideEntity,
        PredictionEntity, TournamentEntity,
    },
    storage::StorageResult,
};

/// Abstraction over the persistence layer for matches, predictions,
/// overrides and the leaderboard of record.
pub trait TournamentStore: Send + Sync {
    /// Full document: both match collections, the prediction log, overrides.
    fn load_snapshot(&self) -> BoxFuture<'static, StorageResult<TournamentEntity>>;
    /// Find a match in either collection.
    fn find_match(
        &self,
        key: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<(MatchEntity, MatchLocation)>>>;
    /// Insert or replace a match, keeping it in its current collection.
    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a match and its predictions; `false` when unknown.
    fn delete_match(&self, key: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Move an open match into history; `false` when not open.
    fn archive_match(
        &self,
        key: Uuid,
        completed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Append to the prediction log, assigning the ingestion sequence.
    fn append_prediction(
        &self,
        prediction: NewPredictionEntity,
    ) -> BoxFuture<'static, StorageResult<PredictionEntity>>;
    /// Delete every row of a `(user, match)` pair; returns the number removed.
    fn delete_predictions(
        &self,
        user: String,
        key: Uuid,
    ) -> BoxFuture<'static, StorageResult<usize>>;
    /// Insert or replace the override of a user.
    fn save_override(&self, entity: OverrideEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the override of a user; `false` when none existed.
    fn delete_override(&self, user: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Set or clear the season title.
    fn save_season(&self, season: Option<String>) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the whole document (restore).
    fn replace_snapshot(&self, snapshot: TournamentEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite the persisted leaderboard.
    fn save_leaderboard(
        &self,
        rows: Vec<LeaderboardRowEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Read the persisted leaderboard, empty when never written.
    fn load_leaderboard(&self) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>>;
    /// Check that the backend can serve requests.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
