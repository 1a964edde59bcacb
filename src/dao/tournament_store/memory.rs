use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dao::{
    models::{
        LeaderboardRowEntity, MatchEntity, MatchLocation, NewPredictionEntity, OverrideEntity,
        PredictionEntity, TournamentEntity,
    },
    storage::StorageResult,
    tournament_store::TournamentStore,
};

#[derive(Default)]
struct MemoryData {
    tournament: TournamentEntity,
    leaderboard: Vec<LeaderboardRowEntity>,
}

/// Volatile store used for tests and throwaway instances.
#[derive(Clone, Default)]
pub struct MemoryTournamentStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryTournamentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_document<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut TournamentEntity) -> T + Send + 'static,
    {
        let data = self.data.clone();
        Box::pin(async move {
            let mut guard = data.lock().await;
            Ok(f(&mut guard.tournament))
        })
    }
}

impl TournamentStore for MemoryTournamentStore {
    fn load_snapshot(&self) -> BoxFuture<'static, StorageResult<TournamentEntity>> {
        self.with_document(|doc| doc.clone())
    }

    fn find_match(
        &self,
        key: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<(MatchEntity, MatchLocation)>>> {
        self.with_document(move |doc| {
            doc.find_match(key)
                .map(|(entity, location)| (entity.clone(), location))
        })
    }

    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.with_document(move |doc| doc.upsert_match(entity))
    }

    fn delete_match(&self, key: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.with_document(move |doc| doc.remove_match(key))
    }

    fn archive_match(
        &self,
        key: Uuid,
        completed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.with_document(move |doc| doc.archive_match(key, completed_at))
    }

    fn append_prediction(
        &self,
        prediction: NewPredictionEntity,
    ) -> BoxFuture<'static, StorageResult<PredictionEntity>> {
        self.with_document(move |doc| doc.append_prediction(prediction))
    }

    fn delete_predictions(
        &self,
        user: String,
        key: Uuid,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        self.with_document(move |doc| doc.remove_predictions(&user, key))
    }

    fn save_override(&self, entity: OverrideEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.with_document(move |doc| doc.upsert_override(entity))
    }

    fn delete_override(&self, user: String) -> BoxFuture<'static, StorageResult<bool>> {
        self.with_document(move |doc| doc.remove_override(&user))
    }

    fn save_season(&self, season: Option<String>) -> BoxFuture<'static, StorageResult<()>> {
        self.with_document(move |doc| doc.set_season(season))
    }

    fn replace_snapshot(
        &self,
        snapshot: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.with_document(move |doc| *doc = snapshot.normalized())
    }

    fn save_leaderboard(
        &self,
        rows: Vec<LeaderboardRowEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let data = self.data.clone();
        Box::pin(async move {
            data.lock().await.leaderboard = rows;
            Ok(())
        })
    }

    fn load_leaderboard(&self) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(data.lock().await.leaderboard.clone()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appended_predictions_are_visible_in_snapshot() {
        let store = MemoryTournamentStore::new();
        let key = Uuid::new_v4();
        let stored = store
            .append_prediction(NewPredictionEntity {
                user: "u1".into(),
                match_key: key,
                prediction: "2-1".into(),
                winner: None,
                submitted_at: SystemTime::UNIX_EPOCH,
            })
            .await
            .unwrap();
        assert_eq!(stored.sequence, 0);

        let snapshot = store.load_snapshot().await.unwrap();
        assert_eq!(snapshot.predictions, vec![stored]);
        assert_eq!(snapshot.next_sequence, 1);
    }

    #[tokio::test]
    async fn leaderboard_starts_empty_and_is_overwritten() {
        let store = MemoryTournamentStore::new();
        assert!(store.load_leaderboard().await.unwrap().is_empty());

        let row = LeaderboardRowEntity {
            user: "u1".into(),
            points: 3,
            predictions: 1,
            exact: 1,
            outcome: 0,
        };
        store.save_leaderboard(vec![row.clone()]).await.unwrap();
        store.save_leaderboard(vec![row.clone()]).await.unwrap();
        assert_eq!(store.load_leaderboard().await.unwrap(), vec![row]);
    }
}
