use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::engine::pool::PoolOptions;
use crate::session::mode::TrainingMode;
use crate::store::paths;

const MAX_POOL_SIZE: usize = 500;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub default_mode: TrainingMode,
    #[serde(default = "default_shuffle_pool")]
    pub shuffle_pool: bool,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_user_id() -> String {
    "local".to_string()
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_shuffle_pool() -> bool {
    false
}
fn default_pool_size() -> usize {
    0
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kotoba")
        .to_string_lossy()
        .to_string()
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            theme: default_theme(),
            default_mode: TrainingMode::default(),
            shuffle_pool: default_shuffle_pool(),
            pool_size: default_pool_size(),
            data_dir: default_data_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kotoba")
            .join("config.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            shuffle: self.shuffle_pool,
            limit: self.pool_size,
        }
    }

    /// Clamp and reset out-of-range values. A user id that cannot be used as
    /// a path segment is an error; a blank one falls back to the default.
    /// Call after deserialization and after applying command-line overrides.
    pub fn validate(&mut self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            self.user_id = default_user_id();
        } else if !paths::is_valid_key(&self.user_id) {
            bail!(
                "invalid user id {:?}: it must not contain / . # $ [ or ]",
                self.user_id
            );
        }
        self.pool_size = self.pool_size.min(MAX_POOL_SIZE);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = default_log_filter();
        }
        Ok(())
    }
}
