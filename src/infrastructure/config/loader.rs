use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{Config, Severity};

/// Default project config file
pub const CONFIG_FILE: &str = "lacework.yaml";

/// Optional local overrides, merged over [`CONFIG_FILE`]
pub const LOCAL_CONFIG_FILE: &str = "lacework.local.yaml";

/// Prefix for environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "LACEWORK_";

/// Longest alert lookback accepted for `fetch.history_days`
pub const MAX_HISTORY_DAYS: u32 = 365;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Lacework account cannot be empty")]
    EmptyAccount,

    #[error("Lacework API key and secret must both be set")]
    MissingCredentials,

    #[error("Invalid Alert Severity Threshold was defined: {0}")]
    InvalidSeverity(String),

    #[error("Invalid history_days: {0}. Must be at least 1")]
    InvalidHistoryDays(u32),

    #[error("history_days of {0} exceeds the maximum of {max}", max = MAX_HISTORY_DAYS)]
    HistoryDaysTooLarge(u32),

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path`, or `lacework.yaml` in the working directory
    /// 3. `lacework.local.yaml` (optional local overrides)
    /// 4. Environment variables (`LACEWORK_*`, highest priority)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config: Config = Self::figment(path)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The merged provider stack, before extraction.
    pub fn figment(path: Option<&Path>) -> Figment {
        let base = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from a single file, without local or env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.api.account.trim().is_empty() {
            return Err(ConfigError::EmptyAccount);
        }

        if config.api.api_key.is_empty() || config.api.api_secret.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        if config.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.api.timeout_secs));
        }

        if config.fetch.severity_threshold.parse::<Severity>().is_err() {
            return Err(ConfigError::InvalidSeverity(
                config.fetch.severity_threshold.clone(),
            ));
        }

        if config.fetch.history_days == 0 {
            return Err(ConfigError::InvalidHistoryDays(config.fetch.history_days));
        }

        if config.fetch.history_days > MAX_HISTORY_DAYS {
            return Err(ConfigError::HistoryDaysTooLarge(config.fetch.history_days));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}
