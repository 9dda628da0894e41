//! # Configuration Management Module
//!
//! Settings for the `rflogger` binary, loaded from TOML. Command line flags override the
//! file; the file overrides the defaults.
//!
//! ## Configuration Structure
//!
//! - [`DeviceConfig`] - serial port and line rate
//! - [`CaptureConfig`] - output table, run length and polling cadence
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Configuration File Format
//!
//! ```toml
//! [device]
//! port = "/dev/ttyUSB0"
//! baud_rate = 500000
//!
//! [capture]
//! output_log = "sweeps.csv"
//! # run_seconds = 3600.0
//! poll_interval_ms = 10
//! status_interval_secs = 1
//!
//! [logging]
//! level = "info"
//! file = "rflogger.log"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::rfexplorer::BAUD_RATES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub port: String,
    /// Must be one of the rates the analyzer accepts.
    pub baud_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// CSV file receiving one row per sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_log: Option<String>,
    /// Stop this many seconds after the first sweep. Runs until interrupted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_seconds: Option<f64>,
    /// Sleep between polls that yield nothing (ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Seconds between status lines.
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_status_interval_secs() -> u64 {
    1
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_log: None,
            run_seconds: None,
            poll_interval_ms: default_poll_interval_ms(),
            status_interval_secs: default_status_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl LoggingConfig {
    /// Configured level, falling back to `info` for unrecognized names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.device.port.trim().is_empty() {
            return Err(anyhow!("device.port must not be empty"));
        }
        if !BAUD_RATES.contains(&self.device.baud_rate) {
            return Err(anyhow!(
                "device.baud_rate {} is not one of {:?}",
                self.device.baud_rate,
                BAUD_RATES
            ));
        }
        if let Some(secs) = self.capture.run_seconds {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(anyhow!("capture.run_seconds must be positive, got {}", secs));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: DeviceConfig {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 500000,
            },
            capture: CaptureConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.device.baud_rate, 500000);
        assert_eq!(config.capture.poll_interval_ms, 10);
    }

    #[test]
    fn test_rejects_unsupported_baud() {
        let mut config = Config::default();
        config.device.baud_rate = 230400;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_run_seconds() {
        let mut config = Config::default();
        config.capture.run_seconds = Some(0.0);
        assert!(config.validate().is_err());
        config.capture.run_seconds = Some(2.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capture_section_defaults() {
        let text = r#"
            [device]
            port = "/dev/ttyACM0"
            baud_rate = 2400

            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture.status_interval_secs, 1);
        assert_eq!(config.capture.output_log, None);
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "chatty".to_string(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let result = tokio_test::block_on(Config::load(path.to_str().unwrap()));
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("Failed to read config file"));
    }

    #[tokio::test]
    async fn test_create_default_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rflogger.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.device.port, "/dev/ttyUSB0");
        assert_eq!(loaded.logging.level, "info");
    }
}
