use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use tokio::{fs, sync::Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dao::{
    models::{
        LeaderboardRowEntity, MatchEntity, MatchLocation, NewPredictionEntity, OverrideEntity,
        PredictionEntity, TournamentEntity,
    },
    storage::StorageResult,
    tournament_store::TournamentStore,
};

use super::{
    config::{FileStoreConfig, temp_path},
    error::{FileDaoError, FileResult},
};

/// JSON documents on local disk, replaced atomically on every write.
///
/// The tournament document is cached in memory; every mutation is applied to
/// a copy that only replaces the cache once it has been written to disk.
#[derive(Clone)]
pub struct FileTournamentStore {
    tournament_path: Arc<PathBuf>,
    leaderboard_path: Arc<PathBuf>,
    document: Arc<Mutex<TournamentEntity>>,
    leaderboard_lock: Arc<Mutex<()>>,
}

impl FileTournamentStore {
    /// Create the data directory if needed and load the current document.
    pub async fn open(config: FileStoreConfig) -> FileResult<Self> {
        fs::create_dir_all(&config.data_dir)
            .await
            .map_err(|source| FileDaoError::CreateDir {
                path: config.data_dir.clone(),
                source,
            })?;

        let tournament_path = config.tournament_path();
        let document = read_json::<TournamentEntity>(&tournament_path)
            .await?
            .unwrap_or_default()
            .normalized();
        info!(
            path = %tournament_path.display(),
            matches = document.matches.len(),
            history = document.history.len(),
            predictions = document.predictions.len(),
            "tournament document loaded"
        );

        Ok(Self {
            tournament_path: Arc::new(tournament_path),
            leaderboard_path: Arc::new(config.leaderboard_path()),
            document: Arc::new(Mutex::new(document)),
            leaderboard_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&TournamentEntity) -> T + Send + 'static,
    {
        let document = self.document.clone();
        Box::pin(async move {
            let guard = document.lock().await;
            Ok(f(&guard))
        })
    }

    fn mutate<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut TournamentEntity) -> T + Send + 'static,
    {
        let document = self.document.clone();
        let path = self.tournament_path.clone();
        Box::pin(async move {
            let mut guard = document.lock().await;
            let mut next = guard.clone();
            let output = f(&mut next);
            write_json_atomic(&path, &next).await.inspect_err(|err| {
                warn!(error = %err, "failed to persist tournament document");
            })?;
            *guard = next;
            Ok(output)
        })
    }
}

impl TournamentStore for FileTournamentStore {
    fn load_snapshot(&self) -> BoxFuture<'static, StorageResult<TournamentEntity>> {
        self.read(|doc| doc.clone())
    }

    fn find_match(
        &self,
        key: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<(MatchEntity, MatchLocation)>>> {
        self.read(move |doc| {
            doc.find_match(key)
                .map(|(entity, location)| (entity.clone(), location))
        })
    }

    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.mutate(move |doc| doc.upsert_match(entity))
    }

    fn delete_match(&self, key: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.mutate(move |doc| doc.remove_match(key))
    }

    fn archive_match(
        &self,
        key: Uuid,
        completed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.mutate(move |doc| doc.archive_match(key, completed_at))
    }

    fn append_prediction(
        &self,
        prediction: NewPredictionEntity,
    ) -> BoxFuture<'static, StorageResult<PredictionEntity>> {
        self.mutate(move |doc| doc.append_prediction(prediction))
    }

    fn delete_predictions(
        &self,
        user: String,
        key: Uuid,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        self.mutate(move |doc| doc.remove_predictions(&user, key))
    }

    fn save_override(&self, entity: OverrideEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.mutate(move |doc| doc.upsert_override(entity))
    }

    fn delete_override(&self, user: String) -> BoxFuture<'static, StorageResult<bool>> {
        self.mutate(move |doc| doc.remove_override(&user))
    }

    fn save_season(&self, season: Option<String>) -> BoxFuture<'static, StorageResult<()>> {
        self.mutate(move |doc| doc.set_season(season))
    }

    fn replace_snapshot(
        &self,
        snapshot: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.mutate(move |doc| *doc = snapshot.normalized())
    }

    fn save_leaderboard(
        &self,
        rows: Vec<LeaderboardRowEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.leaderboard_path.clone();
        let lock = self.leaderboard_lock.clone();
        Box::pin(async move {
            let _guard = lock.lock().await;
            write_json_atomic(&path, &rows).await?;
            Ok(())
        })
    }

    fn load_leaderboard(&self) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRowEntity>>> {
        let path = self.leaderboard_path.clone();
        Box::pin(async move {
            let rows = read_json::<Vec<LeaderboardRowEntity>>(&path).await?;
            Ok(rows.unwrap_or_default())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.tournament_path.clone();
        Box::pin(async move {
            let dir = path.parent().unwrap_or(Path::new("."));
            fs::metadata(dir)
                .await
                .map_err(|source| FileDaoError::Read {
                    path: dir.to_path_buf(),
                    source,
                })?;
            Ok(())
        })
    }
}

async fn read_json<T>(path: &Path) -> FileResult<Option<T>>
where
    T: DeserializeOwned,
{
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(FileDaoError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| FileDaoError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `value` next to `path`, then rename over it so readers never see a
/// partial file.
async fn write_json_atomic<T>(path: &Path, value: &T) -> FileResult<()>
where
    T: ?Sized + Serialize,
{
    let mut json = serde_json::to_vec_pretty(value).map_err(|source| FileDaoError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    json.push(b'\n');

    let tmp = temp_path(path);
    fs::write(&tmp, &json)
        .await
        .map_err(|source| FileDaoError::Write {
            path: tmp.clone(),
            source,
        })?;
    fs::rename(&tmp, path)
        .await
        .map_err(|source| FileDaoError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("matchday-store-{}", Uuid::new_v4()))
    }

    fn match_entity(key: Uuid) -> MatchEntity {
        MatchEntity {
            key,
            team_a: "Hilal".into(),
            team_b: "Nassr".into(),
            kickoff: SystemTime::UNIX_EPOCH,
            final_score: None,
            golden: true,
            declared_winner: None,
            occasion: Some("League".into()),
            round: None,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn mutations_survive_a_reopen() {
        let dir = scratch_dir();
        let store = FileTournamentStore::open(FileStoreConfig::new(&dir))
            .await
            .unwrap();
        let key = Uuid::new_v4();
        store.save_match(match_entity(key)).await.unwrap();
        store
            .append_prediction(NewPredictionEntity {
                user: "u1".into(),
                match_key: key,
                prediction: "1-0".into(),
                winner: None,
                submitted_at: SystemTime::UNIX_EPOCH,
            })
            .await
            .unwrap();
        let before = store.load_snapshot().await.unwrap();

        let reopened = FileTournamentStore::open(FileStoreConfig::new(&dir))
            .await
            .unwrap();
        assert_eq!(reopened.load_snapshot().await.unwrap(), before);
        assert!(!temp_path(&dir.join("tournament.json")).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn leaderboard_bytes_are_stable() {
        let dir = scratch_dir();
        let store = FileTournamentStore::open(FileStoreConfig::new(&dir))
            .await
            .unwrap();
        let rows = vec![LeaderboardRowEntity {
            user: "u1".into(),
            points: 6,
            predictions: 1,
            exact: 1,
            outcome: 0,
        }];
        let path = dir.join("leaderboard.json");

        store.save_leaderboard(rows.clone()).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        store.save_leaderboard(rows.clone()).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().contains("\"Points\": 6"));
        assert_eq!(store.load_leaderboard().await.unwrap(), rows);
        assert!(!temp_path(&path).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tournament.json"), b"{ not json").unwrap();

        let err = FileTournamentStore::open(FileStoreConfig::new(&dir))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FileDaoError::Decode { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
