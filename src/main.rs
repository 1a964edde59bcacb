//! Matchday Back binary entrypoint wiring storage, recompute, REST and SSE layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday_back::{
    build_router,
    config::AppConfig,
    dao::tournament_store::{
        TournamentStore,
        file::{FileStoreConfig, FileTournamentStore},
        memory::MemoryTournamentStore,
    },
    services::leaderboard_service,
    state::AppState,
};

/// Environment variable selecting the storage backend (`file` or `memory`).
const STORE_ENV: &str = "MATCHDAY_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = open_store(&config).await?;
    let app_state = AppState::new(store, config);

    // Serve the last persisted table until the startup recompute lands.
    match leaderboard_service::restore_published(&app_state).await {
        Ok(rows) => info!(rows, "restored persisted leaderboard"),
        Err(err) => warn!(error = %err, "could not restore persisted leaderboard"),
    }
    let report = leaderboard_service::recompute_now(&app_state)
        .await
        .context("initial leaderboard recompute")?;
    info!(users = report.users, scored = report.scored, "startup recompute done");

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the storage backend from the environment.
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn TournamentStore>> {
    let backend = env::var(STORE_ENV).unwrap_or_else(|_| "file".into());
    match backend.trim().to_ascii_lowercase().as_str() {
        "memory" => {
            warn!("using in-memory store; nothing survives a restart");
            Ok(Arc::new(MemoryTournamentStore::new()))
        }
        "file" => {
            let file_config = FileStoreConfig::new(config.data_dir().clone());
            let store = FileTournamentStore::open(file_config)
                .await
                .with_context(|| {
                    format!("opening tournament store in {}", config.data_dir().display())
                })?;
            Ok(Arc::new(store))
        }
        other => anyhow::bail!("unknown {STORE_ENV} value `{other}` (expected `file` or `memory`)"),
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
