use serde::Deserialize;
use std::{env, path::PathBuf, time::Duration};

use tubesort_client::{DEFAULT_BASE_URL, HttpBackendConfig};
use tubesort_types::DEFAULT_TUBE_CAPACITY;

/// Overrides `[server] base_url`.
pub const SERVER_ENV_VAR: &str = "TUBESORT_SERVER";

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_request_timeout() -> u64 {
    120
}

const fn default_delay_ms() -> u64 {
    500
}

const fn default_max_dead_end_recoveries() -> u32 {
    16
}

const fn default_tube_capacity() -> usize {
    DEFAULT_TUBE_CAPACITY
}

/// Contents of `~/.tubesort/config.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct TubesortConfig {
    pub server: Option<ServerConfig>,
    pub play: Option<PlayConfig>,
    pub puzzle: Option<PuzzleConfig>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Backend location and timeouts.
///
/// ```toml
/// [server]
/// base_url = "http://localhost:8000"
/// connect_timeout_seconds = 10
/// request_timeout_seconds = 120
/// ```
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// `${VAR}` references are expanded.
    pub base_url: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Solving can be slow; keep this generous.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Pacing and recovery behavior.
///
/// ```toml
/// [play]
/// step_delay_ms = 500
/// dead_end_delay_ms = 500
/// max_dead_end_recoveries = 16
/// report_dead_ends = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PlayConfig {
    /// Pause between automatically executed solution steps.
    #[serde(default = "default_delay_ms")]
    pub step_delay_ms: u64,
    /// How long a dead end stays on screen before it is undone.
    #[serde(default = "default_delay_ms")]
    pub dead_end_delay_ms: u64,
    /// Consecutive automatic undos before giving up. 0 disables recovery.
    #[serde(default = "default_max_dead_end_recoveries")]
    pub max_dead_end_recoveries: u32,
    /// Send observed dead ends to the backend's telemetry endpoint.
    #[serde(default = "default_true")]
    pub report_dead_ends: bool,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_delay_ms(),
            dead_end_delay_ms: default_delay_ms(),
            max_dead_end_recoveries: default_max_dead_end_recoveries(),
            report_dead_ends: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleConfig {
    #[serde(default = "default_tube_capacity")]
    pub tube_capacity: usize,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            tube_capacity: default_tube_capacity(),
        }
    }
}

/// Settings the [`crate::App`] runs with, resolved from config and defaults.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub step_delay: Duration,
    pub dead_end_delay: Duration,
    pub max_dead_end_recoveries: u32,
    pub report_dead_ends: bool,
    pub tube_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_sections(&PlayConfig::default(), &PuzzleConfig::default())
    }
}

impl EngineSettings {
    fn from_sections(play: &PlayConfig, puzzle: &PuzzleConfig) -> Self {
        Self {
            step_delay: Duration::from_millis(play.step_delay_ms),
            dead_end_delay: Duration::from_millis(play.dead_end_delay_ms),
            max_dead_end_recoveries: play.max_dead_end_recoveries,
            report_dead_ends: play.report_dead_ends,
            tube_capacity: puzzle.tube_capacity,
        }
    }
}

/// Replace `${VAR}` with the variable's value. Unset variables become empty.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl TubesortConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(path)
    }

    pub fn load_from(path: PathBuf) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Base URL: `TUBESORT_SERVER`, then `[server] base_url`, then the default.
    #[must_use]
    pub fn base_url(&self) -> String {
        if let Ok(url) = env::var(SERVER_ENV_VAR)
            && !url.trim().is_empty()
        {
            return url.trim().to_string();
        }
        self.server
            .as_ref()
            .and_then(|s| s.base_url.as_deref())
            .map(expand_env_vars)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    #[must_use]
    pub fn backend_config(&self) -> HttpBackendConfig {
        let server = self.server.as_ref();
        let connect = server.map_or_else(default_connect_timeout, |s| s.connect_timeout_seconds);
        let request = server.map_or_else(default_request_timeout, |s| s.request_timeout_seconds);
        HttpBackendConfig {
            base_url: self.base_url(),
            connect_timeout: Duration::from_secs(connect),
            request_timeout: Duration::from_secs(request),
        }
    }

    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        let play = self.play.clone().unwrap_or_default();
        let puzzle = self.puzzle.clone().unwrap_or_default();
        EngineSettings::from_sections(&play, &puzzle)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tubesort").join("config.toml"))
}
