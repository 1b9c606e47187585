//! Capability detection
//!
//! Runs a fixed sequence of read-only probes against a freshly connected
//! controller. A failed read only means "feature absent"; probing itself
//! never fails.

use crate::api::Identifier;
use crate::charger::BenderCharger;
use crate::registers::{self, Layout, SENTINEL_U32};
use std::fmt;

/// Optional features detected on a device
///
/// Computed once when the device is constructed and never updated; a
/// firmware change requires a new device handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    /// Power, phase currents and energy
    pub metering: bool,
    /// Phase voltages from the auxiliary OCPP meter
    pub voltages: bool,
    /// Vehicle state of charge
    pub battery: bool,
    /// Current limit in 0.1 A steps
    pub fine_current: bool,
    /// 1p/3p switching and phase readback via the power limit
    pub phase_switching: bool,
    /// RFID / EVCCID identification
    pub identification: bool,
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.metering, "metering"),
            (self.voltages, "voltages"),
            (self.battery, "battery"),
            (self.fine_current, "fine-current"),
            (self.phase_switching, "1p3p"),
            (self.identification, "identify"),
        ];
        let present: Vec<&str> = names
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        if present.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", present.join(","))
        }
    }
}

/// Detect the register layout and optional features of `charger`.
///
/// Sets the charger's layout and, when the 0.1 A register answers, switches
/// its active current register to it.
pub(crate) async fn probe(charger: &mut BenderCharger) -> CapabilitySet {
    let mut caps = CapabilitySet::default();

    // Legacy firmware has no model block
    charger.layout = match charger.read(registers::CHARGE_POINT_MODEL).await {
        Ok(_) => Layout::Current,
        Err(e) => {
            charger
                .logger
                .debug(&format!("Model block unreadable, assuming legacy layout: {}", e));
            Layout::Legacy
        }
    };

    let meter_reg = if charger.layout.is_legacy() {
        registers::PHASE_ENERGY.head(2)
    } else {
        registers::ACTIVE_POWER
    };
    caps.metering = matches!(charger.read_u32(meter_reg).await, Ok(v) if v != SENTINEL_U32);

    if caps.metering {
        // OCPP meter reports voltages only when present
        caps.voltages = matches!(
            charger.read_u32(registers::VOLTAGES.head(2)).await,
            Ok(v) if v > 0
        );

        if !charger.layout.is_legacy() {
            caps.battery = charger.read(registers::EV_BATTERY_STATE).await.is_ok();
        }
    }

    if charger.read(registers::HEMS_CURRENT_LIMIT_10).await.is_ok() {
        caps.fine_current = true;
        charger.use_fine_current();
    }

    caps.phase_switching = charger.read(registers::HEMS_POWER_LIMIT).await.is_ok();

    caps.identification = match charger.identify().await {
        Ok(_) => true,
        Err(e) => {
            charger.logger.debug(&format!("Identification unavailable: {}", e));
            false
        }
    };

    charger.logger.info(&format!(
        "Detected {} layout, capabilities: {}",
        charger.layout, caps
    ));
    caps
}
