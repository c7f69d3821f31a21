//! Configuration file loading.
//!
//! Every key is optional; the CLI fills gaps from flags or prompts.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATABASE: &str = "filescope.db";
pub const DEFAULT_CSV: &str = "search_results.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required value: {0} (pass it as a flag or drop --no-input)")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log_level: Option<String>,
    pub database: DatabaseConfig,
    pub scan: ScanConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub root: Option<String>,
    pub exclude: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub csv_path: Option<String>,
    pub chart: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            chart: true,
        }
    }
}

impl Config {
    /// Load `explicit` if given, else the default location if it exists,
    /// else an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `<config dir>/filescope/config.toml`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "filescope").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Expand a leading `~` in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Split a comma-separated exclusion answer exactly as typed.
///
/// Nothing is trimmed or lower-cased, so an empty answer yields one empty
/// entry, which excludes files without an extension.
pub fn parse_exclusions(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}
