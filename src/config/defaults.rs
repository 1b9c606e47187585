use super::*;

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            driver: "bender".to_string(),
            device_instance: 0,
        }
    }
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            ip: "192.168.1.100".to_string(),
            port: 502,
            unit_id: 255,
            connect_timeout_ms: 5000,
            operation_timeout_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/bender-cc.log".to_string(),
            backup_count: 5,
            file_output: false,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            charger: ChargerConfig::default(),
            modbus: ModbusConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
