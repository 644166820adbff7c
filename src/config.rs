//! Application-level configuration loading, including the session timing and veto policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "VETO_SESSION_CONFIG_PATH";

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    session: SessionSettings,
}

/// Timing and policy knobs of the shared playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Maximum age of the cached playback snapshot.
    pub snapshot_ttl: Duration,
    /// Bound on every call to the playback provider.
    pub upstream_timeout: Duration,
    /// How long a skip may stay unconfirmed before vetoes count again.
    pub skip_confirmation: Duration,
    /// Whether a single veto can skip when fewer than two participants joined.
    pub allow_small_roster_skip: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(1),
            upstream_timeout: Duration::from_secs(5),
            skip_confirmation: Duration::from_secs(10),
            allow_small_roster_skip: true,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        ttl_ms = app_config.session.snapshot_ttl.as_millis(),
                        "loaded session settings from config"
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
        }
    }

    /// Parse a JSON configuration document. Missing keys keep their defaults.
    pub fn parse(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Settings of the shared playback session.
    pub fn session(&self) -> &SessionSettings {
        &self.session
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    session: RawSessionSettings,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            session: value.session.into(),
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the `session` block, durations in milliseconds.
struct RawSessionSettings {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "snapshot_ttl_ms")]
    snapshot_ttl: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "upstream_timeout_ms")]
    upstream_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "skip_confirmation_ms")]
    skip_confirmation: Duration,
    allow_small_roster_skip: bool,
}

impl Default for RawSessionSettings {
    fn default() -> Self {
        let defaults = SessionSettings::default();
        Self {
            snapshot_ttl: defaults.snapshot_ttl,
            upstream_timeout: defaults.upstream_timeout,
            skip_confirmation: defaults.skip_confirmation,
            allow_small_roster_skip: defaults.allow_small_roster_skip,
        }
    }
}

impl From<RawSessionSettings> for SessionSettings {
    fn from(value: RawSessionSettings) -> Self {
        Self {
            snapshot_ttl: value.snapshot_ttl,
            upstream_timeout: value.upstream_timeout,
            skip_confirmation: value.skip_confirmation,
            allow_small_roster_skip: value.allow_small_roster_skip,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
