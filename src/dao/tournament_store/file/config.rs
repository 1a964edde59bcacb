use std::path::{Path, PathBuf};

const TOURNAMENT_FILE: &str = "tournament.json";
const LEADERBOARD_FILE: &str = "leaderboard.json";

/// Where the JSON file store keeps its documents.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Directory holding `tournament.json` and `leaderboard.json`.
    pub data_dir: PathBuf,
}

impl FileStoreConfig {
    /// Store everything under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub(super) fn tournament_path(&self) -> PathBuf {
        self.data_dir.join(TOURNAMENT_FILE)
    }

    pub(super) fn leaderboard_path(&self) -> PathBuf {
        self.data_dir.join(LEADERBOARD_FILE)
    }
}

/// Sibling path used for atomic replacement of `path`.
pub(super) fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}
