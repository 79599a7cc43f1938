//! Scheduler configuration and algorithm constants.
//!
//! Store selection is read from `config.toml`, then the environment, then
//! falls back to defaults. The numeric constants below calibrate the
//! scheduling algorithm and the analysis reports.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::paths;

// ==================== Store Configuration ====================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config.toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown store backend: {0}")]
    UnknownBackend(String),
}

/// Which `ReviewStore` implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Json,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" => Ok(Self::Json),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Json => "json",
            Self::Memory => "memory",
        }
    }

    fn default_path(&self) -> PathBuf {
        match self {
            Self::Sqlite => PathBuf::from(paths::sqlite_path()),
            Self::Json => PathBuf::from(paths::json_path()),
            Self::Memory => PathBuf::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Ignored for the memory backend
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: StoreBackend::Sqlite.default_path(),
        }
    }
}

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    store: Option<StoreSection>,
}

#[derive(Debug, Deserialize)]
struct StoreSection {
    backend: Option<String>,
    path: Option<String>,
}

/// Load the store configuration with priority: config.toml > .env > default
pub fn load_store_config() -> Result<StoreConfig, ConfigError> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    if let Some(config) = read_config_file(Path::new("config.toml"))? {
        tracing::info!(
            "Using {} store from config.toml: {}",
            config.backend.as_str(),
            config.path.display()
        );
        return Ok(config);
    }

    // Priority 2: environment
    let env_backend = std::env::var("REVIEW_STORE").ok();
    let env_path = std::env::var("REVIEW_STORE_PATH").ok();
    if env_backend.is_some() || env_path.is_some() {
        let config = resolve(env_backend.as_deref(), env_path.as_deref())?;
        tracing::info!(
            "Using {} store from environment: {}",
            config.backend.as_str(),
            config.path.display()
        );
        return Ok(config);
    }

    // Default
    let config = StoreConfig::default();
    tracing::info!("Using default sqlite store: {}", config.path.display());
    Ok(config)
}

/// Read the `[store]` section of a config file.
///
/// Returns `Ok(None)` when the file does not exist or has no `[store]` section.
pub fn read_config_file(path: &Path) -> Result<Option<StoreConfig>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<Option<StoreConfig>, ConfigError> {
    let config: AppConfig = toml::from_str(contents)?;
    match config.store {
        Some(store) => Ok(Some(resolve(store.backend.as_deref(), store.path.as_deref())?)),
        None => Ok(None),
    }
}

fn resolve(backend: Option<&str>, path: Option<&str>) -> Result<StoreConfig, ConfigError> {
    let backend = match backend {
        Some(name) => name.parse()?,
        None => StoreBackend::Sqlite,
    };
    let path = path.map(PathBuf::from).unwrap_or_else(|| backend.default_path());
    Ok(StoreConfig { backend, path })
}

// ==================== SM-2 Configuration ====================

/// Ease factor of a never-reviewed item
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor floor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Interval after the first correct answer
pub const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval after the second consecutive correct answer
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Upper bound on a scheduled interval (~100 years) so review dates stay
/// representable
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Correct answers at or under this many seconds grade as "perfect"
pub const FAST_RESPONSE_SECS: f64 = 5.0;

/// Correct answers at or under this many seconds grade as "hesitant"
pub const HESITANT_RESPONSE_SECS: f64 = 10.0;

// ==================== Priority Configuration ====================

/// Priority of an item the user has never seen
pub const NEW_ITEM_PRIORITY: f64 = 100.0;

/// Cap on the overdue-days bonus term
pub const OVERDUE_BONUS_CAP_DAYS: i64 = 30;

// ==================== Selection Configuration ====================

/// Default quiz size for due and difficulty quizzes
pub const DEFAULT_QUIZ_SIZE: usize = 10;

/// Default quiz size for mixed review
pub const DEFAULT_MIXED_QUIZ_SIZE: usize = 15;

/// Share of a mixed review reserved for due items
pub const MIXED_DUE_SHARE: f64 = 0.6;

/// Default calendar window for the review schedule
pub const DEFAULT_SCHEDULE_DAYS: u32 = 7;

/// Longest calendar window a schedule may cover (~10 years)
pub const MAX_SCHEDULE_DAYS: u32 = 3_650;

// ==================== Analysis Configuration ====================

/// Minimum attempts before an item can be listed as difficult
pub const DIFFICULT_MIN_ATTEMPTS: u32 = 2;

/// Items under this success rate are listed as difficult
pub const DIFFICULT_SUCCESS_RATE: f64 = 0.7;

/// Limit for difficult questions in an error summary
pub const DIFFICULT_QUESTIONS_LIMIT: usize = 10;

/// Average response time (seconds) above which an item counts as slow
pub const SLOW_RESPONSE_SECS: f64 = 20.0;

/// Limit for slow questions in the error patterns
pub const SLOW_QUESTIONS_LIMIT: usize = 5;

/// Limit for improvement suggestions
pub const SUGGESTIONS_LIMIT: usize = 4;

/// Limit for progress recommendations
pub const RECOMMENDATIONS_LIMIT: usize = 5;
