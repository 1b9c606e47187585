//! Error types and handling for the Bender driver
//!
//! This module defines the error types used throughout the crate. Transport
//! failures are passed through unchanged; the remaining variants describe
//! bad caller input, out-of-domain register contents and values that are
//! momentarily unavailable.

use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Main error type for the driver
#[derive(Debug, Error)]
pub enum DriverError {
    /// Register I/O failure reported by the transport (including timeouts
    /// and Modbus exception responses)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Caller supplied an out-of-range input; no register was touched
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// A register decoded to a value outside its defined domain
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The feature exists but has no meaningful value right now
    #[error("not available")]
    NotAvailable,

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DriverError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        DriverError::Transport {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        DriverError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        DriverError::Protocol {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        DriverError::Config {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        DriverError::Io {
            message: message.into(),
        }
    }

    /// Whether this error came from the register transport
    pub fn is_transport(&self) -> bool {
        matches!(self, DriverError::Transport { .. })
    }

    /// Whether this error only signals that no value is available right now
    pub fn is_not_available(&self) -> bool {
        matches!(self, DriverError::NotAvailable)
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for DriverError {
    fn from(err: serde_yaml::Error) -> Self {
        DriverError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DriverError::transport("connection reset");
        assert!(matches!(err, DriverError::Transport { .. }));
        assert!(err.is_transport());

        let err = DriverError::protocol("invalid status: 9");
        assert!(matches!(err, DriverError::Protocol { .. }));

        let err = DriverError::validation("current", "below minimum");
        assert!(matches!(err, DriverError::Validation { .. }));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_error_display() {
        let err = DriverError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = DriverError::validation("current", "invalid current 5");
        assert_eq!(
            format!("{}", err),
            "Validation error: current - invalid current 5"
        );

        assert_eq!(DriverError::NotAvailable.to_string(), "not available");
    }
}
