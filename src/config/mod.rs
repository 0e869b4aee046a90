// Configuration management module

use crate::error::{DashboardError, Result};
use crate::log::{LogConfig, LogLevel};
use crate::log_info;
use crate::repository::DEFAULT_LIMIT;
use crate::retry::RetryConfig;
use crate::utils::fs::{atomic_write, ensure_dir};
use crate::validators::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_MB};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_CONFIG_DIR: &str = ".sirc_config";
const APP_CONFIG_NAME: &str = "sirc_config.json";
const CONFIG_DIR_ENV: &str = "SIRC_CONFIG_DIR";

/// Main configuration structure for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub version: String,
    #[serde(skip, default = "get_config_dir")]
    pub config_dir: PathBuf,
    /// Retry policy used when loading the dataset
    pub retry: RetryConfig,
    pub page_size: usize,
    pub log_level: LogLevel,
    /// Bytes
    pub max_log_size: u64,
    /// JSON snapshot to load instead of the embedded seed
    pub data_file: Option<PathBuf>,
    pub max_upload_mb: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_dir: get_config_dir(),
            retry: RetryConfig::default(),
            page_size: DEFAULT_LIMIT,
            log_level: LogLevel::Info,
            max_log_size: 1024 * 1024,
            data_file: None,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from disk, creating default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_dir())
    }

    /// Same as `load`, rooted at `config_dir`
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(APP_CONFIG_NAME);

        log_info!("Loading configuration from {}", config_path.display());

        let mut config: Self = if config_path.exists() {
            let data = std::fs::read_to_string(&config_path).map_err(|e| {
                DashboardError::Config(format!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

            serde_json::from_str(&data).map_err(|e| {
                DashboardError::Config(format!("Failed to parse config file: {}", e))
            })?
        } else {
            log_info!("Config file not found, creating default configuration");
            Self::default()
        };
        config.config_dir = config_dir.to_path_buf();

        config.validate()?;
        config.save()?;

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path();

        log_info!("Saving configuration to {}", config_path.display());

        ensure_dir(&self.config_dir)?;

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DashboardError::Config(format!("Failed to serialize config: {}", e)))?;

        atomic_write(&config_path, &json)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.config_dir.to_str().is_none() {
            return Err(DashboardError::Config(
                "Config directory path contains invalid UTF-8".to_string(),
            ));
        }

        if self.retry.max_retries < 1 {
            return Err(DashboardError::Config(
                "retry.max_retries must be at least 1".to_string(),
            ));
        }
        if self.retry.retry_delay_ms == 0 {
            return Err(DashboardError::Config(
                "retry.retry_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.retry_delay_ms {
            return Err(DashboardError::Config(format!(
                "retry.max_delay_ms ({}) must not be below retry.retry_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.retry_delay_ms
            )));
        }

        if self.page_size < 1 {
            return Err(DashboardError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.max_upload_mb < 1 {
            return Err(DashboardError::Config(
                "max_upload_mb must be at least 1".to_string(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(DashboardError::Config(
                "allowed_extensions must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(APP_CONFIG_NAME)
    }

    /// Logging setup derived from this configuration
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.config_dir.join("logs"),
            log_level: self.log_level,
            max_file_size: self.max_log_size,
        }
    }
}

/// Get the configuration directory path: `$SIRC_CONFIG_DIR`, or
/// `.sirc_config` next to the executable
pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|parent| parent.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_CONFIG_DIR)
}

/// Get the configuration file path
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(APP_CONFIG_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn creates_default_config_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_from(dir.path()).unwrap();

        assert_eq!(config.page_size, 10);
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.allowed_extensions, vec!["csv", "txt", "xls", "xlsx"]);
        assert!(dir.path().join(APP_CONFIG_NAME).exists());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::load_from(dir.path()).unwrap();
        config.retry = RetryConfig::new(5).with_backoff(false);
        config.data_file = Some(PathBuf::from("/tmp/snapshot.json"));
        config.log_level = LogLevel::Debug;
        config.save().unwrap();

        let loaded = DashboardConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(APP_CONFIG_NAME),
            r#"{ "page_size": 25, "retry": { "max_retries": 7 } }"#,
        )
        .unwrap();

        let config = DashboardConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.retry.retry_delay_ms, 2000);
        assert_eq!(config.max_upload_mb, 10);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = DashboardConfig::default();
        config.retry.max_retries = 0;
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));

        let mut config = DashboardConfig::default();
        config.retry.max_delay_ms = 500;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.retry.retry_delay_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn broken_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(APP_CONFIG_NAME), "{").unwrap();
        assert!(matches!(
            DashboardConfig::load_from(dir.path()),
            Err(DashboardError::Config(_))
        ));
    }

    #[test]
    fn log_config_lives_under_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_from(dir.path()).unwrap();
        let log = config.log_config();
        assert_eq!(log.log_dir, dir.path().join("logs"));
        assert_eq!(log.log_level, LogLevel::Info);
    }
}
