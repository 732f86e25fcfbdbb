//! Configuration file support for MediHelp.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medihelp/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
}

/// Where the data files live
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Users file, relative to `data_dir` unless absolute
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,

    /// Medicines file opened on start, relative to `data_dir` unless absolute
    #[serde(default = "default_medicines_file")]
    pub medicines_file: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            users_file: default_users_file(),
            medicines_file: default_medicines_file(),
        }
    }
}

impl DataConfig {
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    pub fn medicines_path(&self) -> PathBuf {
        self.data_dir.join(&self.medicines_file)
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(base) => base.join("medihelp"),
        None => PathBuf::from("data"),
    }
}

fn default_users_file() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_medicines_file() -> PathBuf {
    PathBuf::from("medicines.csv")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            config_path => {
                tracing::info!(
                    "No config file found at {:?}, using defaults",
                    config_path
                );
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("medihelp").join("config.toml"))
    }

    /// Save the configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Point every data path at `data_dir`.
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data.data_dir = data_dir;
        self
    }
}
