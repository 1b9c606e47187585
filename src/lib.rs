//! # bender-cc - Bender CC612/CC613 charge controller driver
//!
//! Talks Modbus TCP to chargers built on the Bender CC612/CC613 controller
//! series and exposes them as a small set of high-level capabilities.
//!
//! ## Architecture
//!
//! - `registers`: register catalog for both firmware layouts
//! - `codec`: decoding of register words into typed values
//! - `transport`: the register I/O seam the driver consumes
//! - `modbus`: Modbus TCP implementation of the transport
//! - `charger`: register transactions behind every operation
//! - `probe`: capability detection at connection time
//! - `device`: the handle exposing only detected capabilities
//! - `api`: capability traits
//! - `registry`: explicit name to factory registration
//! - `config`, `logging`, `error`: ambient plumbing
//!
//! ## Usage
//!
//! ```no_run
//! use bender_cc::{BenderDevice, Charger, Config};
//!
//! # async fn run() -> bender_cc::Result<()> {
//! let config = Config::load()?;
//! let mut device = BenderDevice::connect(&config).await?;
//! device.max_current(16).await?;
//! if let Some(meter) = device.meter() {
//!     println!("{} W", meter.current_power().await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod charger;
pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod modbus;
pub mod probe;
pub mod registers;
pub mod registry;
pub mod transport;

// Re-export commonly used types
pub use api::{
    Battery, ChargeStatus, Charger, ChargerEx, Diagnosis, Diagnostics, Identifier, Meter,
    MeterEnergy, PhaseCurrents, PhaseGetter, PhaseSwitcher, PhaseVoltages,
};
pub use config::Config;
pub use device::BenderDevice;
pub use error::{DriverError, Result};
pub use probe::CapabilitySet;
pub use registers::Layout;
pub use registry::Registry;
pub use transport::Transport;
