//! Capability traits exposed by a charger handle
//!
//! [`Charger`] is mandatory. Every other trait is optional and is handed out
//! by the device only when the matching feature was detected.

use crate::error::Result;
use std::fmt;

/// Vehicle connection state derived from the control pilot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    /// State A: no vehicle connected
    NotConnected,
    /// State B: vehicle connected, not charging
    Connected,
    /// State C: charging
    Charging,
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargeStatus::NotConnected => write!(f, "A (not connected)"),
            ChargeStatus::Connected => write!(f, "B (connected)"),
            ChargeStatus::Charging => write!(f, "C (charging)"),
        }
    }
}

/// Core charger control, available on every device
#[async_trait::async_trait]
pub trait Charger: Send {
    async fn status(&mut self) -> Result<ChargeStatus>;

    /// Whether the active current limit is non-zero
    async fn enabled(&mut self) -> Result<bool>;

    /// Restore the last commanded current, or write 0 to pause charging
    async fn enable(&mut self, enable: bool) -> Result<()>;

    /// Set the current limit in whole amps
    async fn max_current(&mut self, current: i64) -> Result<()>;
}

/// Current limit with 0.1 A resolution
#[async_trait::async_trait]
pub trait ChargerEx: Send {
    async fn max_current_millis(&mut self, current: f64) -> Result<()>;
}

/// Instantaneous charging power in W
#[async_trait::async_trait]
pub trait Meter: Send {
    async fn current_power(&mut self) -> Result<f64>;
}

/// Total imported energy in kWh
#[async_trait::async_trait]
pub trait MeterEnergy: Send {
    async fn total_energy(&mut self) -> Result<f64>;
}

/// Per-phase currents in A
#[async_trait::async_trait]
pub trait PhaseCurrents: Send {
    async fn currents(&mut self) -> Result<(f64, f64, f64)>;
}

/// Per-phase voltages in V
#[async_trait::async_trait]
pub trait PhaseVoltages: Send {
    async fn voltages(&mut self) -> Result<(f64, f64, f64)>;
}

/// Vehicle state of charge in percent
#[async_trait::async_trait]
pub trait Battery: Send {
    async fn soc(&mut self) -> Result<f64>;
}

/// Vehicle or RFID identification; an empty string means "nothing to report"
#[async_trait::async_trait]
pub trait Identifier: Send {
    async fn identify(&mut self) -> Result<String>;
}

/// Switch between single-phase and three-phase charging
#[async_trait::async_trait]
pub trait PhaseSwitcher: Send {
    async fn phases_1p3p(&mut self, phases: u8) -> Result<()>;
}

/// Number of phases currently allowed
#[async_trait::async_trait]
pub trait PhaseGetter: Send {
    async fn get_phases(&mut self) -> Result<u8>;
}

/// Best-effort dump of diagnostic registers
#[async_trait::async_trait]
pub trait Diagnosis: Send {
    async fn diagnose(&mut self) -> Diagnostics;
}

/// Diagnostic fields that could be read, in read order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<(String, String)>,
}

impl Diagnostics {
    pub fn push(&mut self, label: &str, value: impl fmt::Display) {
        self.entries.push((label.to_string(), value.to_string()));
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in &self.entries {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_render_one_line_per_field() {
        let mut d = Diagnostics::default();
        d.push("Legacy", false);
        d.push("Current Limit", 16);
        assert_eq!(d.to_string(), "Legacy: false\nCurrent Limit: 16\n");
        assert_eq!(d.get("Current Limit"), Some("16"));
        assert_eq!(d.get("Model"), None);
    }
}
