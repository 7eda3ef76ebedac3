//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a TOML file. Config file resolution
//! follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `RECITAL_CONFIG` environment variable
//! 3. User config file (`<config dir>/recital/config.toml`) when present
//! 4. Compiled defaults (fallback)
//!
//! A missing config file never stops a client: it logs a warning and runs on
//! defaults. A file that exists but does not parse is an error.

use crate::cache::write_atomic;
use crate::program::ProgramFormat;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "RECITAL_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Local cache file (fallback state shared between clients)
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Remote API endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the program list comes from
    #[serde(default)]
    pub program: ProgramConfig,

    /// Display and notice timing
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// `false` runs on the local cache only (no backend)
    #[serde(default = "default_use_api")]
    pub use_api: bool,

    #[serde(default = "default_current_program_url")]
    pub current_program_url: String,

    #[serde(default = "default_sequences_url")]
    pub sequences_url: String,

    #[serde(default = "default_checkin_status_url")]
    pub checkin_status_url: String,

    #[serde(default = "default_checkin_update_url")]
    pub checkin_update_url: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProgramConfig {
    /// Local file path or http(s) URL of the program
    #[serde(default = "default_program_source")]
    pub source: String,

    #[serde(default)]
    pub format: ProgramFormat,

    /// Directory program images are resolved against
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Display polling interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How often the cache file is checked for writes by other clients
    #[serde(default = "default_cache_watch_interval_ms")]
    pub cache_watch_interval_ms: u64,

    /// How long a status notice stays visible
    #[serde(default = "default_notice_duration_ms")]
    pub notice_duration_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_use_api() -> bool {
    true
}

fn default_current_program_url() -> String {
    "http://127.0.0.1:8000/api/current-program".to_string()
}

fn default_sequences_url() -> String {
    "http://127.0.0.1:8000/api/sequences".to_string()
}

fn default_checkin_status_url() -> String {
    "http://127.0.0.1:8000/sba/checkin-status".to_string()
}

fn default_checkin_update_url() -> String {
    "http://127.0.0.1:8000/sba/checkin-update".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_program_source() -> String {
    "data/programs.csv".to_string()
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("data/images")
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_cache_watch_interval_ms() -> u64 {
    500
}

fn default_notice_duration_ms() -> u64 {
    3_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            use_api: default_use_api(),
            current_program_url: default_current_program_url(),
            sequences_url: default_sequences_url(),
            checkin_status_url: default_checkin_status_url(),
            checkin_update_url: default_checkin_update_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            source: default_program_source(),
            format: ProgramFormat::default(),
            images_dir: default_images_dir(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            cache_watch_interval_ms: default_cache_watch_interval_ms(),
            notice_duration_ms: default_notice_duration_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            api: ApiConfig::default(),
            program: ProgramConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.display.poll_interval_ms)
    }

    pub fn cache_watch_interval(&self) -> Duration {
        Duration::from_millis(self.display.cache_watch_interval_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.display.notice_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.request_timeout_ms)
    }

    /// Cache file: configured path, else the platform data directory
    pub fn resolved_cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }

    /// Reject values that would make the clients spin or never fire
    pub fn validate(&self) -> Result<()> {
        if self.display.poll_interval_ms == 0 {
            return Err(Error::Config(
                "display.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.display.cache_watch_interval_ms == 0 {
            return Err(Error::Config(
                "display.cache_watch_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.program.source.trim().is_empty() {
            return Err(Error::Config("program.source must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Default config file location for the platform (`<config dir>/recital/config.toml`)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recital").join("config.toml"))
}

/// Default cache location (`<local data dir>/recital/cache.json`)
pub fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("recital").join("cache.json"))
        .unwrap_or_else(|| PathBuf::from("./recital_cache.json"))
}

/// Pick the config file to load, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config file, only when it exists
    default_config_file().filter(|path| path.exists())
}

/// Load configuration, falling back to compiled defaults
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write a config file atomically (temp + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    write_atomic(path, content.as_bytes())
}
