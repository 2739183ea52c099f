//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `ACTON_ENVELOPE_`, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/acton-envelope/config.toml
//! 4. System directory: /etc/acton-envelope/config.toml
//! 5. Default values
//!
//! ```toml
//! [pagination]
//! default_page_size = 10
//! max_page_size = 50
//! max_records = 1000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! `ACTON_ENVELOPE_PAGINATION__MAX_PAGE_SIZE=100` overrides
//! `pagination.max_page_size`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::pagination::PaginationConfig;

/// Application name used for config directories
const APP_NAME: &str = "acton-envelope";

/// Environment variable prefix
const ENV_PREFIX: &str = "ACTON_ENVELOPE_";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Pagination limits
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter, in `EnvFilter` syntax
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Every config file found is merged, lower priority first, and
    /// environment variables override all of them. The pagination limits are
    /// validated before the configuration is returned.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the search path; environment variables still apply. A
    /// missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()));

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.pagination.validate()?;
        Ok(config)
    }

    /// Candidate config file paths, highest priority first
    ///
    /// 1. Current working directory
    /// 2. XDG config directory (only when the file exists)
    /// 3. System directory
    pub fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME);
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(Path::new("/etc").join(APP_NAME).join("config.toml"));
        paths
    }
}
