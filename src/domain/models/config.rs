use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::search::DEFAULT_ROW_LIMIT;

/// Main configuration structure for the adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Lacework API credentials and connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Incident polling settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Default row cap for paginated searches
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    /// Directory for file results (e.g. `cloudtrail-<uuid>.json`)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_row_limit() -> usize {
    DEFAULT_ROW_LIMIT
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            fetch: FetchConfig::default(),
            row_limit: default_row_limit(),
            output_dir: default_output_dir(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Lacework API connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    /// Account name (`acme`) or host (`acme.lacework.net`)
    #[serde(default)]
    pub account: String,

    /// Optional sub-account
    #[serde(default)]
    pub subaccount: Option<String>,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub api_secret: String,

    /// Overrides the URL derived from `account`
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            subaccount: None,
            api_key: String::new(),
            api_secret: String::new(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("account", &self.account)
            .field("subaccount", &self.subaccount)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Incident polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FetchConfig {
    /// Least severe alert level that becomes an incident
    #[serde(default = "default_severity_threshold")]
    pub severity_threshold: String,

    /// Lookback window in days
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Where the poll cursor is kept between runs
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_severity_threshold() -> String {
    "high".to_string()
}

const fn default_history_days() -> u32 {
    1
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".lacework/last_run.json")
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            severity_threshold: default_severity_threshold(),
            history_days: default_history_days(),
            state_file: default_state_file(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling log files; none disables file logging
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Write logs to stderr. Stdout is reserved for command results.
    #[serde(default = "default_true")]
    pub enable_stderr: bool,

    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}
