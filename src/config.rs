//! Application-level configuration loading: storage location, admin access
//! and scoring rules.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::scoring::{ScoringRules, points::ExactComparison};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCHDAY_BACK_CONFIG_PATH";
/// Environment variable that overrides the configured admin token.
const ADMIN_TOKEN_ENV: &str = "MATCHDAY_ADMIN_TOKEN";
/// Directory used by the file store when none is configured.
const DEFAULT_DATA_DIR: &str = "data";
/// Hours before kick-off when predictions open.
const DEFAULT_PREDICTION_WINDOW_HOURS: u64 = 2;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    data_dir: PathBuf,
    admin_token: Option<String>,
    prediction_window: Duration,
    scoring: ScoringRules,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to defaults.
    ///
    /// The admin token from the environment always wins over the file.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        data_dir = %app_config.data_dir.display(),
                        window_hours = app_config.prediction_window.as_secs() / 3600,
                        exact_comparison = ?app_config.scoring.exact_comparison,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        match env::var(ADMIN_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => config.with_admin_token(token),
            _ => {
                if config.admin_token.is_none() {
                    warn!("no admin token configured; admin routes are disabled");
                }
                config
            }
        }
    }

    /// Replace the admin token.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Directory of the file store.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Shared secret expected in the admin header, if admin access is enabled.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// How long before kick-off predictions are accepted.
    pub fn prediction_window(&self) -> Duration {
        self.prediction_window
    }

    /// Rules used by every recompute.
    pub fn scoring(&self) -> &ScoringRules {
        &self.scoring
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            admin_token: None,
            prediction_window: hours(DEFAULT_PREDICTION_WINDOW_HOURS),
            scoring: ScoringRules::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    admin_token: Option<String>,
    #[serde(default)]
    prediction_window_hours: Option<u64>,
    #[serde(default)]
    scoring: RawScoring,
}

#[derive(Debug, Default, Deserialize)]
/// `scoring` section of the configuration file.
struct RawScoring {
    #[serde(default)]
    exact_comparison: Option<ExactComparison>,
    #[serde(default)]
    include_override_only_users: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: value.data_dir.unwrap_or(defaults.data_dir),
            admin_token: value.admin_token.filter(|token| !token.trim().is_empty()),
            prediction_window: value
                .prediction_window_hours
                .map_or(defaults.prediction_window, hours),
            scoring: ScoringRules {
                exact_comparison: value
                    .scoring
                    .exact_comparison
                    .unwrap_or(defaults.scoring.exact_comparison),
                include_override_only_users: value
                    .scoring
                    .include_override_only_users
                    .unwrap_or(defaults.scoring.include_override_only_users),
            },
        }
    }
}

fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60 * 60))
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
