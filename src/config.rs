//! Configuration management for the Bender driver
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which registered driver to instantiate
    pub charger: ChargerConfig,

    /// Modbus TCP connection configuration
    pub modbus: ModbusConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Charger selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerConfig {
    /// Registered driver name (e.g. "bender")
    pub driver: String,

    /// Device instance, attached to log lines of this charger
    pub device_instance: u32,
}

/// Modbus TCP connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusConfig {
    /// IP address of the charge controller
    pub ip: String,

    /// TCP port (typically 502)
    pub port: u16,

    /// Modbus unit identifier; the controller answers on 255
    pub unit_id: u8,

    /// Timeout for establishing the TCP connection
    pub connect_timeout_ms: u64,

    /// Timeout for a single register transaction
    pub operation_timeout_ms: u64,
}

impl ModbusConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional override for the console layer
    pub console_level: Option<String>,

    /// Optional override for the file layer
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to write to a log file at all
    pub file_output: bool,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "bender_config.yaml",
            "/data/bender_config.yaml",
            "/etc/bender-cc/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.charger.driver.trim().is_empty() {
            return Err(DriverError::validation(
                "charger.driver",
                "Driver name cannot be empty",
            ));
        }

        if self.modbus.ip.is_empty() {
            return Err(DriverError::validation(
                "modbus.ip",
                "IP address cannot be empty",
            ));
        }

        if self.modbus.port == 0 {
            return Err(DriverError::validation(
                "modbus.port",
                "Port must be greater than 0",
            ));
        }

        if self.modbus.connect_timeout_ms == 0 || self.modbus.operation_timeout_ms == 0 {
            return Err(DriverError::validation(
                "modbus.timeouts",
                "Timeouts must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.modbus.port, 502);
        assert_eq!(config.modbus.unit_id, 255);
        assert_eq!(config.charger.driver, "bender");
        assert_eq!(config.modbus.operation_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Test invalid IP
        config.modbus.ip = String::new();
        assert!(config.validate().is_err());

        // Reset and test invalid port
        config = Config::default();
        config.modbus.port = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.charger.driver = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("modbus:\n  ip: 10.1.2.3\n").unwrap();
        assert_eq!(config.modbus.ip, "10.1.2.3");
        assert_eq!(config.modbus.port, 502);
        assert_eq!(config.logging.level, "INFO");
    }
}
