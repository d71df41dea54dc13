//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where the vault and durable data live and how to log.
//! - Load JSON config merged onto defaults, then apply env overrides.
//!
//! # Invariants
//! - A missing config file yields defaults, not an error.
//! - Every field is optional on disk; absent fields keep their defaults.
//! - Blank env overrides are ignored.

use crate::annotation::store::DEFAULT_DATA_KEY;
use crate::blob::{BlobResult, BlobStore, JsonFileBlobStore, SqliteBlobStore};
use crate::settings::DEFAULT_SETTINGS_KEY;
use crate::vault::DEFAULT_INCLUDE_PATTERN;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ENV_VAULT_ROOT: &str = "DAYNOTES_VAULT_ROOT";
pub const ENV_DATA_PATH: &str = "DAYNOTES_DATA_PATH";
pub const ENV_LOG_LEVEL: &str = "DAYNOTES_LOG_LEVEL";

const SQLITE_FILE_NAME: &str = "daynotes.sqlite3";

/// Durable blob backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobBackend {
    /// One JSON file per key under `data_path`.
    #[default]
    JsonFile,
    /// A single SQLite database under `data_path`.
    Sqlite,
}

/// Configuration load failures.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Runtime configuration for hosts embedding the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory scanned for documents.
    pub vault_root: PathBuf,
    /// Directory holding durable blobs.
    pub data_path: PathBuf,
    pub backend: BlobBackend,
    /// Blob key of the annotation record.
    pub data_key: String,
    /// Blob key of the view settings.
    pub settings_key: String,
    /// Regex matched against vault-relative document paths.
    pub include_pattern: String,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::from("."),
            data_path: PathBuf::from(".daynotes"),
            backend: BlobBackend::default(),
            data_key: DEFAULT_DATA_KEY.to_string(),
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            include_pattern: DEFAULT_INCLUDE_PATTERN.to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Opens the configured blob backend.
    pub fn open_blob_store(&self) -> BlobResult<Box<dyn BlobStore + Send>> {
        match self.backend {
            BlobBackend::JsonFile => Ok(Box::new(JsonFileBlobStore::open(&self.data_path)?)),
            BlobBackend::Sqlite => {
                std::fs::create_dir_all(&self.data_path)?;
                Ok(Box::new(SqliteBlobStore::open(
                    self.data_path.join(SQLITE_FILE_NAME),
                )?))
            }
        }
    }
}

/// Loads config from `path` (defaults when absent) and applies process env.
pub fn load_config(path: Option<&Path>) -> Result<CoreConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => CoreConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Applies `DAYNOTES_*` overrides read through `lookup`.
pub fn apply_env_overrides(config: &mut CoreConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(value) = non_blank(lookup(ENV_VAULT_ROOT)) {
        config.vault_root = PathBuf::from(value);
    }
    if let Some(value) = non_blank(lookup(ENV_DATA_PATH)) {
        config.data_path = PathBuf::from(value);
    }
    if let Some(value) = non_blank(lookup(ENV_LOG_LEVEL)) {
        config.log_level = value;
    }
}

/// Reads one JSON config file without env overrides.
pub fn read_config(path: &Path) -> Result<CoreConfig, ConfigError> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(
                "event=config_load module=config status=missing path={}",
                path.display()
            );
            return Ok(CoreConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{apply_env_overrides, CoreConfig, ENV_DATA_PATH, ENV_LOG_LEVEL};
    use std::path::PathBuf;

    #[test]
    fn env_overrides_skip_blank_values() {
        let mut config = CoreConfig::default();
        apply_env_overrides(&mut config, |name| match name {
            ENV_DATA_PATH => Some("  /srv/daynotes  ".to_string()),
            ENV_LOG_LEVEL => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.data_path, PathBuf::from("/srv/daynotes"));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
    }
}
