//! Configuration for bank sync

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the ledger snapshot inside `data_dir`
pub const LEDGER_FILE_NAME: &str = "sync_state.json";

/// Upper bound on `sync_interval_hours` (one year)
pub const MAX_SYNC_INTERVAL_HOURS: u64 = 24 * 366;

/// Upper bound on `lookback_days` and `retention_days` (ten years)
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "/config.toml";

/// Bank sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source bank API key
    pub mercury_api_key: String,

    /// Source bank API base URL
    pub mercury_base_url: String,

    /// Destination API token
    pub invoice_ninja_token: String,

    /// Destination base URL (`/api/v1` is appended)
    pub invoice_ninja_url: String,

    /// Provider name of the destination bank integration
    pub bank_provider: String,

    /// Hours between cycle starts
    pub sync_interval_hours: u64,

    /// Trailing days of source transactions fetched each cycle
    pub lookback_days: i64,

    /// Trailing days a ledger entry is kept
    pub retention_days: i64,

    /// Log level (debug, info, warn, error)
    pub log_level: String,

    /// Directory holding the ledger snapshot
    pub data_dir: PathBuf,

    /// HTTP transport configuration
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mercury_api_key: String::new(),
            mercury_base_url: "https://api.mercury.com/api/v1".to_string(),
            invoice_ninja_token: String::new(),
            invoice_ninja_url: String::new(),
            bank_provider: "Mercury".to_string(),
            sync_interval_hours: 1,
            lookback_days: 7,  // bank transactions typically settle in 3-5 days
            retention_days: 7,
            log_level: "info".to_string(),
            data_dir: PathBuf::from("/data"),
            http: HttpConfig::default(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// First backoff delay (milliseconds)
    pub initial_delay_ms: u64,

    /// Backoff cap (milliseconds)
    pub max_delay_ms: u64,

    /// Per-request timeout (seconds)
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load defaults, the config file, then environment overrides, and validate.
    ///
    /// The file named by `BANK_SYNC_CONFIG` must exist; the default
    /// location is optional.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var("BANK_SYNC_CONFIG") {
            Ok(path) => Self::from_file(&path)
                .map_err(|e| Error::Config(format!("Error loading {}: {}", path, e)))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("MERCURY_API_KEY") {
            self.mercury_api_key = key;
        }
        if let Some(token) = lookup("INVOICE_NINJA_TOKEN") {
            self.invoice_ninja_token = token;
        }
        if let Some(url) = lookup("INVOICE_NINJA_URL") {
            self.invoice_ninja_url = url;
        }
        if let Some(dir) = lookup("BANK_SYNC_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("BANK_SYNC_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(hours) = lookup("BANK_SYNC_INTERVAL_HOURS") {
            self.sync_interval_hours = hours
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BANK_SYNC_INTERVAL_HOURS: {}", hours)))?;
        }
        if let Some(days) = lookup("BANK_SYNC_LOOKBACK_DAYS") {
            self.lookback_days = days
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BANK_SYNC_LOOKBACK_DAYS: {}", days)))?;
        }
        if let Some(days) = lookup("BANK_SYNC_RETENTION_DAYS") {
            self.retention_days = days
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BANK_SYNC_RETENTION_DAYS: {}", days)))?;
        }
        Ok(())
    }

    /// Check required keys and bounds
    pub fn validate(&self) -> Result<()> {
        if self.mercury_api_key.is_empty() {
            return Err(Error::Config("missing Mercury API key".to_string()));
        }
        if self.invoice_ninja_token.is_empty() {
            return Err(Error::Config("missing InvoiceNinja token".to_string()));
        }
        validate_url("InvoiceNinja URL", &self.invoice_ninja_url)?;
        validate_url("Mercury base URL", &self.mercury_base_url)?;

        if self.sync_interval_hours == 0 {
            return Err(Error::Config("sync_interval_hours must be at least 1".to_string()));
        }
        if self.sync_interval_hours > MAX_SYNC_INTERVAL_HOURS {
            return Err(Error::Config(format!(
                "sync_interval_hours must be at most {}",
                MAX_SYNC_INTERVAL_HOURS
            )));
        }
        if self.lookback_days < 1 {
            return Err(Error::Config("lookback_days must be at least 1".to_string()));
        }
        if self.retention_days > MAX_WINDOW_DAYS {
            return Err(Error::Config(format!(
                "retention_days must be at most {}",
                MAX_WINDOW_DAYS
            )));
        }
        if self.retention_days < self.lookback_days {
            return Err(Error::Config(format!(
                "retention_days ({}) must not be shorter than lookback_days ({})",
                self.retention_days, self.lookback_days
            )));
        }
        Ok(())
    }

    /// Path of the ledger snapshot
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE_NAME)
    }

    /// Time between cycle starts, clamped to `1..=MAX_SYNC_INTERVAL_HOURS`
    pub fn sync_interval(&self) -> Duration {
        let hours = self.sync_interval_hours.clamp(1, MAX_SYNC_INTERVAL_HOURS);
        Duration::from_secs(hours.checked_mul(3600).unwrap_or(u64::MAX))
    }

    /// Source lookback window
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(self.lookback_days.clamp(1, MAX_WINDOW_DAYS))
    }

    /// Ledger retention window
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days.clamp(1, MAX_WINDOW_DAYS))
    }
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| Error::Config(format!("invalid {}: {}", name, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Config(format!("invalid {}: unsupported scheme {}", name, scheme))),
    }
}
