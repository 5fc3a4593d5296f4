//! Runtime configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `GAPE_DB_PATH` | `./data/gape.sqlite3` (`~/` expanded) |
//! | `GAPE_LOG_LEVEL` | `debug` in debug builds, `info` otherwise |
//! | `GAPE_LOG_DIR` | unset: file logging stays off |
//! | `GAPE_COLUMNS` | `3`; values below 1 or unparsable fall back |

use crate::logging::default_log_level;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "GAPE_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "GAPE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "GAPE_LOG_DIR";
pub const COLUMNS_ENV: &str = "GAPE_COLUMNS";

const DEFAULT_DB_PATH: &str = "./data/gape.sqlite3";
/// Desktop presentation width.
pub const DEFAULT_COLUMN_COUNT: usize = 3;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(value) => {
                write!(f, "{LOG_LEVEL_ENV}=`{value}` is not trace|debug|info|warn|error")
            }
            Self::RelativeLogDir(value) => {
                write!(f, "{LOG_DIR_ENV}=`{value}` must be an absolute path")
            }
        }
    }
}

impl Error for ConfigError {}

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// Minimum column count of a freshly opened session.
    pub default_column_count: usize,
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_ENV)
            .map(|path| expand_tilde(&path, &lookup))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let log_level = match read(LOG_LEVEL_ENV) {
            None => default_log_level().to_string(),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                level @ ("trace" | "debug" | "info" | "warn" | "error") => level.to_string(),
                _ => return Err(ConfigError::InvalidLogLevel(value)),
            },
        };

        let log_dir = match read(LOG_DIR_ENV) {
            None => None,
            Some(value) => {
                let dir = expand_tilde(&value, &lookup);
                if !dir.is_absolute() {
                    return Err(ConfigError::RelativeLogDir(value));
                }
                Some(dir)
            }
        };

        let default_column_count = read(COLUMNS_ENV)
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|count| *count >= 1)
            .unwrap_or(DEFAULT_COLUMN_COUNT);

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            default_column_count,
        })
    }
}

fn expand_tilde(path: &str, lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir(lookup) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn resolve_home_dir(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .into_iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}
