//! Modbus TCP transport for the Bender charge controller
//!
//! A thin [`Transport`] implementation over `tokio-modbus`. Every transaction
//! is bounded by the configured operation timeout; failures are reported as
//! transport errors and never retried here.

use crate::config::ModbusConfig;
use crate::error::{DriverError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::transport::Transport;
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::client::tcp;
use tokio_modbus::prelude::*;

/// Modbus TCP client for controller communication
pub struct ModbusClient {
    /// Modbus TCP client connection
    client: Option<tokio_modbus::client::Context>,

    /// Configuration
    config: ModbusConfig,

    /// Connection timeout
    connection_timeout: Duration,

    /// Operation timeout
    operation_timeout: Duration,

    /// Logger
    logger: StructuredLogger,
}

impl ModbusClient {
    /// Create a new, not yet connected, Modbus client
    pub fn new(config: &ModbusConfig) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("modbus").with_field("unit_id", config.unit_id.to_string()),
        );
        Self {
            client: None,
            config: config.clone(),
            connection_timeout: config.connect_timeout(),
            operation_timeout: config.operation_timeout(),
            logger,
        }
    }

    /// Create a client and connect it right away
    pub async fn connect_new(config: &ModbusConfig) -> Result<Self> {
        let mut client = Self::new(config);
        client.connect().await?;
        Ok(client)
    }

    /// Connect to the Modbus server
    pub async fn connect(&mut self) -> Result<()> {
        let address = format!("{}:{}", self.config.ip, self.config.port);

        self.logger.info(&format!("Connecting to Modbus server at {}", address));

        let socket_addr: std::net::SocketAddr = address
            .parse()
            .map_err(|e| DriverError::transport(format!("Invalid socket address: {}", e)))?;

        let slave = Slave(self.config.unit_id);
        match timeout(
            self.connection_timeout,
            tcp::connect_slave(socket_addr, slave),
        )
        .await
        {
            Ok(Ok(client)) => {
                self.client = Some(client);
                self.logger.info("Successfully connected to Modbus server");
                Ok(())
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to connect to Modbus server: {}", e);
                self.logger.error(&error_msg);
                Err(DriverError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = "Connection timeout".to_string();
                self.logger.error(&error_msg);
                Err(DriverError::transport(error_msg))
            }
        }
    }

    /// Get client reference or error if not connected
    fn get_client(&mut self) -> Result<&mut tokio_modbus::client::Context> {
        self.client
            .as_mut()
            .ok_or_else(|| DriverError::transport("Not connected to Modbus server"))
    }
}

#[async_trait::async_trait]
impl Transport for ModbusClient {
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>> {
        let timeout_duration = self.operation_timeout;

        // Log before borrowing client
        self.logger.trace(&format!(
            "Reading {} registers from address {}",
            count, address
        ));

        let client = self.get_client()?;
        let request = client.read_holding_registers(address, count);

        match timeout(timeout_duration, request).await {
            Ok(Ok(Ok(response))) => {
                self.logger.trace(&format!("Read {} registers: {:?}", response.len(), response));
                Ok(response)
            }
            // Exceptions are routine while probing optional registers
            Ok(Ok(Err(exception))) => {
                let error_msg = format!(
                    "Modbus exception reading {} registers at {}: {:?}",
                    count, address, exception
                );
                self.logger.debug(&error_msg);
                Err(DriverError::transport(error_msg))
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to read holding registers: {}", e);
                self.logger.error(&error_msg);
                Err(DriverError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = "Read operation timeout".to_string();
                self.logger.error(&error_msg);
                Err(DriverError::transport(error_msg))
            }
        }
    }

    async fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<()> {
        let timeout_duration = self.operation_timeout;

        // Log before borrowing client
        self.logger.debug(&format!(
            "Writing {:?} to registers starting at {}",
            values, address
        ));

        let client = self.get_client()?;
        let request = client.write_multiple_registers(address, values);

        match timeout(timeout_duration, request).await {
            Ok(Ok(Ok(()))) => {
                self.logger.trace("Successfully wrote multiple registers");
                Ok(())
            }
            Ok(Ok(Err(exception))) => {
                let error_msg = format!(
                    "Modbus exception writing registers at {}: {:?}",
                    address, exception
                );
                self.logger.warn(&error_msg);
                Err(DriverError::transport(error_msg))
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to write multiple registers: {}", e);
                self.logger.error(&error_msg);
                Err(DriverError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = "Write operation timeout".to_string();
                self.logger.error(&error_msg);
                Err(DriverError::transport(error_msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modbus_client_creation() {
        let config = ModbusConfig::default();
        let client = ModbusClient::new(&config);
        assert!(client.client.is_none());
        assert_eq!(client.operation_timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_read_before_connect_is_transport_error() {
        let mut client = ModbusClient::new(&ModbusConfig::default());
        let err = client.read_registers(122, 1).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("Not connected"));
    }
}
