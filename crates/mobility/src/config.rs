//! Runtime configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the TOML file
//! (`~/.config/mobility/config.toml` unless `--config` says otherwise), then
//! `MOBILITY_`-prefixed environment variables with `__` between section and
//! field, e.g. `MOBILITY_STORAGE__WAL=false`.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const APP_DIR: &str = "mobility";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "defaults.db";
const BACKUP_SUBDIR: &str = "backups";
const ENV_PREFIX: &str = "MOBILITY_";

/// All configurable settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[storage]`
    pub storage: StorageConfig,
    /// `[backup]`
    pub backup: BackupConfig,
}

/// Where and how preferences are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults database file. `None` means `<data dir>/mobility/defaults.db`.
    pub database_path: Option<PathBuf>,
    /// Use `SQLite` write-ahead logging.
    pub wal: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            wal: true,
        }
    }
}

/// Preference backup export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Where `prefs backup` writes when no output is given. `None` means
    /// `<data dir>/mobility/backups`.
    pub directory: Option<PathBuf>,
    /// Indent exported JSON.
    pub pretty: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: None,
            pretty: true,
        }
    }
}

impl Config {
    /// Load from the default config file and the environment.
    ///
    /// # Errors
    ///
    /// Fails if a source cannot be parsed or the result does not validate.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load using `config_path` in place of the default file. A missing
    /// file is not an error.
    ///
    /// # Errors
    ///
    /// Fails if a source cannot be parsed or the result does not validate.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/mobility/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// `<local data dir>/mobility`.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(APP_DIR)
    }

    /// Reject paths that cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.storage.database_path {
            require_non_empty(path, "storage.database_path")?;
            if path.file_name().is_none() {
                return Err(Error::InvalidConfig(format!(
                    "storage.database_path ({}) must name a file",
                    path.display()
                )));
            }
        }
        if let Some(dir) = &self.backup.directory {
            require_non_empty(dir, "backup.directory")?;
        }
        Ok(())
    }

    /// The configured database file, or the default one.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE))
    }

    /// The configured backup directory, or the default one.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.backup
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(BACKUP_SUBDIR))
    }
}

fn require_non_empty(path: &Path, setting: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidConfig(format!("{setting} must not be empty")));
    }
    Ok(())
}
