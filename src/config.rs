//! Configuration using Figment
//!
//! Configuration is loaded from:
//! 1. a TOML file (`config/sd_logger.toml` by default)
//! 2. environment variables prefixed with `SD_LOGGER_`, nested keys separated by `__`
//!
//! # Example
//! ```no_run
//! use sd_logger::config::LoggerConfig;
//!
//! let config = LoggerConfig::load()?;
//! println!("Logging to {}", config.storage.target_path().display());
//! # Ok::<(), figment::Error>(())
//! ```
//!
//! Environment overrides look like `SD_LOGGER_STORAGE__BUFFER_CAPACITY=10` or
//! `SD_LOGGER_APPLICATION__LOG_LEVEL=debug`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LoggerError, LoggerResult};
use crate::logger::{LoggerOptions, DEFAULT_BUFFER_CAPACITY, DEFAULT_DELIMITER, DEFAULT_MOUNT_POINT};
use crate::record::{validate_delimiter, validate_file_name, validate_header};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/sd_logger.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoggerConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Log file settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Name reported in startup logs
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Diagnostic output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Where and how records are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory the card is mounted on
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,
    /// Bare name of the log file inside the mount point
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Records held in memory before a flush
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Header column separator
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// First line of a newly created file
    #[serde(default)]
    pub header_columns: Option<Vec<String>>,
}

fn default_name() -> String {
    "sd-logger".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_mount_point() -> PathBuf {
    PathBuf::from(DEFAULT_MOUNT_POINT)
}

fn default_file_name() -> String {
    "sensor.csv".to_string()
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mount_point: default_mount_point(),
            file_name: default_file_name(),
            buffer_capacity: default_buffer_capacity(),
            delimiter: default_delimiter(),
            header_columns: None,
        }
    }
}

impl StorageConfig {
    /// Path of the log file: `<mount_point>/<file_name>`.
    pub fn target_path(&self) -> PathBuf {
        self.mount_point.join(&self.file_name)
    }

    /// Logger construction options for this storage section.
    pub fn to_options(&self) -> LoggerOptions {
        LoggerOptions {
            file_name: self.file_name.clone(),
            mount_point: self.mount_point.clone(),
            buffer_capacity: self.buffer_capacity,
            delimiter: self.delimiter,
            header_columns: self.header_columns.clone(),
        }
    }
}

impl LoggerConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is not an error: defaults and environment variables still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    /// Load, then validate, reporting both failure kinds as [`LoggerError`].
    pub fn load_validated<P: AsRef<Path>>(path: P) -> LoggerResult<Self> {
        let config = Self::load_from(path)?;
        config.validate().map_err(LoggerError::Configuration)?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(LoggerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SD_LOGGER_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            ));
        }

        let storage = &self.storage;
        if storage.buffer_capacity == 0 {
            return Err("Invalid buffer_capacity 0. Must be at least 1".to_string());
        }
        validate_file_name(&storage.file_name).map_err(|e| e.to_string())?;
        if storage.mount_point.as_os_str().is_empty() {
            return Err("mount_point cannot be empty".to_string());
        }
        validate_delimiter(storage.delimiter).map_err(|e| e.to_string())?;
        if let Some(columns) = &storage.header_columns {
            validate_header(columns, storage.delimiter).map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sd_logger.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    #[serial]
    fn test_load_from_toml() {
        let (_dir, path) = write_config(
            r#"
            [application]
            name = "greenhouse"
            log_level = "debug"

            [storage]
            mount_point = "/sd"
            file_name = "climate.csv"
            buffer_capacity = 3
            delimiter = ","
            header_columns = ["date", "value"]
            "#,
        );

        let config = LoggerConfig::load_from(&path).unwrap();
        assert_eq!(config.application.name, "greenhouse");
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.storage.target_path(), PathBuf::from("/sd/climate.csv"));
        assert_eq!(config.storage.buffer_capacity, 3);
        assert_eq!(config.storage.delimiter, ',');
        assert_eq!(
            config.storage.header_columns,
            Some(vec!["date".to_string(), "value".to_string()])
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = LoggerConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, LoggerConfig::default());
        assert_eq!(config.storage.buffer_capacity, 60);
        assert_eq!(config.storage.delimiter, ';');
        assert_eq!(config.storage.mount_point, PathBuf::from("sd"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let (_dir, path) = write_config(
            r#"
            [storage]
            file_name = "climate.csv"
            buffer_capacity = 3
            "#,
        );

        std::env::set_var("SD_LOGGER_STORAGE__BUFFER_CAPACITY", "12");
        let result = LoggerConfig::load_from(&path);
        std::env::remove_var("SD_LOGGER_STORAGE__BUFFER_CAPACITY");

        let config = result.unwrap();
        assert_eq!(config.storage.buffer_capacity, 12);
        assert_eq!(config.storage.file_name, "climate.csv");
    }

    #[test]
    #[serial]
    fn test_load_validated_rejects_zero_capacity() {
        let (_dir, path) = write_config("[storage]\nbuffer_capacity = 0\n");
        let err = LoggerConfig::load_validated(&path).unwrap_err();
        assert!(matches!(err, LoggerError::Configuration(_)));
    }

    #[test]
    #[serial]
    fn test_load_validated_reports_parse_errors() {
        let (_dir, path) = write_config("[storage]\nbuffer_capacity = \"many\"\n");
        let err = LoggerConfig::load_validated(&path).unwrap_err();
        assert!(matches!(err, LoggerError::Config(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = LoggerConfig::default();
        assert!(config.validate().is_ok());

        config.application.log_level = "loud".to_string();
        assert!(config.validate().is_err());
        config.application.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());

        config.application.log_format = "xml".to_string();
        assert!(config.validate().is_err());
        config.application.log_format = "JSON".to_string();
        assert!(config.validate().is_ok());

        config.storage.file_name = String::new();
        assert!(config.validate().is_err());
        config.storage.file_name = "nested/log.csv".to_string();
        assert!(config.validate().is_err());
        config.storage.file_name = "/tmp/escaped.csv".to_string();
        assert!(config.validate().is_err());
        config.storage.file_name = "log.csv".to_string();

        config.storage.delimiter = '\n';
        assert!(config.validate().is_err());
        config.storage.delimiter = '\r';
        assert!(config.validate().is_err());
        config.storage.delimiter = ';';

        config.storage.header_columns = Some(vec!["a;b".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_options() {
        let mut config = LoggerConfig::default();
        config.storage.mount_point = PathBuf::from("/sd");
        config.storage.header_columns = Some(vec!["date".to_string()]);

        let options = config.storage.to_options();
        assert_eq!(options.target_path(), PathBuf::from("/sd/sensor.csv"));
        assert_eq!(options.buffer_capacity, 60);
        assert_eq!(options.header_columns, Some(vec!["date".to_string()]));
    }
}
