//! Configuration loading for sortscope.
//!
//! The file lives at `~/.sortscope/config.toml` unless `SORTSCOPE_CONFIG`
//! points elsewhere. Raw structs mirror the TOML layout with `Option` fields;
//! [`SortscopeConfig::resolve`] turns them into a validated
//! [`sortscope_types::Settings`].
//!
//! ```toml
//! [app]
//! algorithm = "quick"
//!
//! [playback]
//! speed = 70
//! base_delay_ms = 500
//! decay_factor = 0.95
//! min_delay_ms = 1
//!
//! [dataset]
//! size = 40
//! min_value = 5
//! max_value = 104
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use sortscope_types::{AlgorithmId, DatasetSize, Pacing, Settings, Speed, ValueRange};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SORTSCOPE_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct SortscopeConfig {
    pub app: Option<AppConfig>,
    pub playback: Option<PlaybackConfig>,
    pub dataset: Option<DatasetConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Algorithm selected at startup (e.g. "bubble", "quick").
    pub algorithm: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaybackConfig {
    /// 1..=100, higher is faster. Out-of-range values are clamped.
    pub speed: Option<i64>,
    pub base_delay_ms: Option<u64>,
    pub decay_factor: Option<f64>,
    pub min_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatasetConfig {
    /// 10..=200. Out-of-range values are clamped.
    pub size: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl SortscopeConfig {
    /// Load the config from the default location.
    ///
    /// Returns `Ok(None)` when no config file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve raw values into validated settings, falling back to defaults
    /// for anything unset.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();

        let algorithm = match self.app.as_ref().and_then(|app| app.algorithm.as_deref()) {
            Some(raw) => AlgorithmId::parse(raw)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown algorithm `{raw}`")))?,
            None => defaults.algorithm,
        };

        let playback = self.playback.as_ref();
        let speed = match playback.and_then(|p| p.speed) {
            Some(raw) => Speed::new(raw).unwrap_or_else(|err| {
                tracing::warn!("{err}; clamping");
                Speed::clamped(raw)
            }),
            None => defaults.speed,
        };

        let base_delay = playback
            .and_then(|p| p.base_delay_ms)
            .map_or(Pacing::DEFAULT_BASE_DELAY, Duration::from_millis);
        let decay_factor = playback
            .and_then(|p| p.decay_factor)
            .unwrap_or(Pacing::DEFAULT_DECAY_FACTOR);
        let min_delay = playback
            .and_then(|p| p.min_delay_ms)
            .map_or(Pacing::DEFAULT_MIN_DELAY, Duration::from_millis);
        let pacing = Pacing::new(base_delay, decay_factor, min_delay)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        let dataset = self.dataset.as_ref();
        let size = match dataset.and_then(|d| d.size) {
            Some(raw) => DatasetSize::new(raw).unwrap_or_else(|err| {
                tracing::warn!("{err}; clamping");
                DatasetSize::clamped(raw)
            }),
            None => defaults.size,
        };
        let values = ValueRange::new(
            dataset
                .and_then(|d| d.min_value)
                .unwrap_or(ValueRange::DEFAULT.min()),
            dataset
                .and_then(|d| d.max_value)
                .unwrap_or(ValueRange::DEFAULT.max()),
        )
        .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        Ok(Settings {
            algorithm,
            speed,
            size,
            values,
            pacing,
        })
    }
}

/// Load and resolve settings from the default location.
///
/// A missing file yields defaults; an unreadable or invalid one is an error.
pub fn load_settings() -> Result<Settings, ConfigError> {
    match SortscopeConfig::load()? {
        Some(config) => config.resolve(),
        None => Ok(Settings::default()),
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".sortscope").join("config.toml"))
}
