pub mod match_lifecycle;
pub mod mutations;
mod sse;
pub mod tournament;

use std::{future::Future, sync::Arc};

use tokio::sync::{Mutex, RwLock};

use crate::{config::AppConfig, dao::tournament_store::TournamentStore, scoring::leaderboard::Leaderboard};

pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Capacity of the public SSE broadcast channel.
const PUBLIC_SSE_CAPACITY: usize = 16;

/// Central application state: storage, configuration, the published
/// leaderboard and the SSE hub.
pub struct AppState {
    store: Arc<dyn TournamentStore>,
    config: Arc<AppConfig>,
    sse: SseHub,
    leaderboard: RwLock<Arc<Leaderboard>>,
    recompute_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The published leaderboard starts empty until the first recompute.
    pub fn new(store: Arc<dyn TournamentStore>, config: AppConfig) -> SharedState {
        Arc::new(Self {
            store,
            config: Arc::new(config),
            sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            leaderboard: RwLock::new(Arc::new(Leaderboard::default())),
            recompute_gate: Mutex::new(()),
        })
    }

    /// Handle to the storage backend.
    pub fn store(&self) -> Arc<dyn TournamentStore> {
        self.store.clone()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Latest published leaderboard. Never blocks on a running recompute.
    pub async fn leaderboard(&self) -> Arc<Leaderboard> {
        self.leaderboard.read().await.clone()
    }

    /// Swap in a freshly materialized leaderboard.
    pub async fn publish_leaderboard(&self, leaderboard: Leaderboard) -> Arc<Leaderboard> {
        let leaderboard = Arc::new(leaderboard);
        *self.leaderboard.write().await = leaderboard.clone();
        leaderboard
    }

    /// Run `work` while holding the recompute gate, so at most one
    /// mutate-then-recompute cycle runs at a time.
    pub async fn run_exclusive<F, Fut, T>(&self, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _gate = self.recompute_gate.lock().await;
        work().await
    }
}
