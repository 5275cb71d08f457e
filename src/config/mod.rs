// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{GitHubApiError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file (`path`, or `~/.github-gateway/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // An explicitly requested file must exist
            .add_source(File::from(file).required(required))
            // Override with environment variables, e.g. GITHUB_GATEWAY__CACHE__BACKEND=redis
            .add_source(
                Environment::with_prefix("GITHUB_GATEWAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| GitHubApiError::Configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| GitHubApiError::Configuration(e.to_string()))
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".github-gateway")
            .join("config.toml")
    }
}
