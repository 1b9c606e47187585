//! Register catalog of the Bender CC612/CC613 Modbus TCP server
//!
//! All registers are holding registers using the "Ebee/Bender/MENNEKES"
//! address set. Legacy firmware lacks the model block (and the smart
//! vehicle registers); both layouts share the remaining addresses.

use std::fmt;

/// Register layout generation detected at probe time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Older firmware without the model block
    Legacy,
    /// Current firmware
    Current,
}

impl Layout {
    pub fn is_legacy(self) -> bool {
        matches!(self, Layout::Legacy)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Legacy => write!(f, "legacy"),
            Layout::Current => write!(f, "current"),
        }
    }
}

/// Encoding of a register block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Single unsigned 16-bit register
    U16,
    /// Unsigned 32-bit value, high word first
    U32,
    /// Three consecutive 32-bit values (L1, L2, L3)
    U32Triplet,
    /// Fixed-length byte block holding ASCII text
    Text,
}

/// One entry of the register catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub name: &'static str,
    pub address: u16,
    /// Width in 16-bit registers
    pub count: u16,
    pub encoding: Encoding,
    /// Raw value divided by this yields the engineering unit
    pub divisor: u32,
    /// Whether an all-ones 32-bit value means "no data" and decodes as 0
    pub sentinel: bool,
}

impl Register {
    const fn u16(name: &'static str, address: u16) -> Self {
        Self {
            name,
            address,
            count: 1,
            encoding: Encoding::U16,
            divisor: 1,
            sentinel: false,
        }
    }

    const fn u32(name: &'static str, address: u16, divisor: u32) -> Self {
        Self {
            name,
            address,
            count: 2,
            encoding: Encoding::U32,
            divisor,
            sentinel: false,
        }
    }

    const fn triplet(name: &'static str, address: u16, divisor: u32) -> Self {
        Self {
            name,
            address,
            count: 6,
            encoding: Encoding::U32Triplet,
            divisor,
            sentinel: true,
        }
    }

    const fn text(name: &'static str, address: u16, count: u16) -> Self {
        Self {
            name,
            address,
            count,
            encoding: Encoding::Text,
            divisor: 1,
            sentinel: false,
        }
    }

    /// The same register with all-ones values taken literally
    const fn without_sentinel(self) -> Self {
        Self {
            sentinel: false,
            ..self
        }
    }

    /// The same register narrowed to its first `count` words
    pub const fn head(self, count: u16) -> Self {
        Self { count, ..self }
    }
}

/// Application version number (text)
pub const FIRMWARE: Register = Register::text("firmware", 100, 2);
/// Charge point status according to the OCPP status enumeration
pub const OCPP_CP_STATUS: Register = Register::u16("ocpp_cp_status", 104);
/// Modbus TCP server protocol version (text)
pub const PROTOCOL_VERSION: Register = Register::text("protocol_version", 120, 2);
/// Vehicle (control pilot) state
pub const CHARGE_POINT_STATE: Register = Register::u16("charge_point_state", 122);
/// Charge point model, bytes 0 to 19; absent on legacy firmware
pub const CHARGE_POINT_MODEL: Register = Register::text("charge_point_model", 142, 10);

/// Phase energy from the primary meter (Wh), L1..L3
pub const PHASE_ENERGY: Register =
    Register::triplet("phase_energy", 200, 1000).without_sentinel();
/// Phase currents from the primary meter (mA), L1..L3
pub const CURRENTS: Register = Register::triplet("currents", 212, 1000);
/// Total energy from the primary meter (Wh)
pub const TOTAL_ENERGY: Register = Register::u32("total_energy", 218, 1000);
/// Active power from the primary meter (W)
pub const ACTIVE_POWER: Register = Register::u32("active_power", 220, 1);
/// Phase voltages of the OCPP meter (V), L1..L3
pub const VOLTAGES: Register = Register::triplet("voltages", 222, 1);

/// OCPP IdTag of the current session, bytes 0 to 19
pub const USER_ID: Register = Register::text("user_id", 720, 10);
/// EV battery state (% 0-100)
pub const EV_BATTERY_STATE: Register = Register::u16("ev_battery_state", 730);
/// 1 if the connected EV is a smart vehicle, else 0
pub const SMART_VEHICLE_DETECTED: Register = Register::u16("smart_vehicle_detected", 740);
/// ASCII hex representation of the EVCCID, bytes 0 to 11
pub const EVCCID: Register = Register::text("evccid", 741, 6);

/// HEMS current limit (A)
pub const HEMS_CURRENT_LIMIT: Register = Register::u16("hems_current_limit", 1000);
/// HEMS current limit (0.1 A)
pub const HEMS_CURRENT_LIMIT_10: Register = Register::u16("hems_current_limit_10", 1001);
/// HEMS power limit (W)
pub const HEMS_POWER_LIMIT: Register = Register::u16("hems_power_limit", 1002);

/// Highest power limit that still forces single-phase charging: 207 V × 3 × 6 A - 1 W
pub const POWER_LIMIT_1P: u16 = 3725;
/// Power limit that releases all three phases
pub const POWER_LIMIT_3P: u16 = u16::MAX;

/// Raw 32-bit pattern meaning "no data"
pub const SENTINEL_U32: u32 = u32::MAX;

/// Lowest charging current the controller accepts (A)
pub const MIN_CURRENT: u16 = 6;

/// Nominal voltage used to derive power on legacy firmware
pub const NOMINAL_VOLTAGE: f64 = 230.0;

/// Unit of the register holding the active current limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentUnit {
    /// Whole amps, register 1000
    Amps,
    /// Tenths of an amp, register 1001
    Deciamps,
}

impl CurrentUnit {
    pub const fn register(self) -> Register {
        match self {
            CurrentUnit::Amps => HEMS_CURRENT_LIMIT,
            CurrentUnit::Deciamps => HEMS_CURRENT_LIMIT_10,
        }
    }

    /// Raw register units per amp
    pub const fn per_amp(self) -> u16 {
        match self {
            CurrentUnit::Amps => 1,
            CurrentUnit::Deciamps => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_phase_ceiling_stays_below_three_phase_minimum() {
        assert!(f64::from(POWER_LIMIT_1P) < 207.0 * 3.0 * f64::from(MIN_CURRENT));
        assert!(POWER_LIMIT_1P < POWER_LIMIT_3P);
    }

    #[test]
    fn triplets_span_three_u32_values() {
        for reg in [PHASE_ENERGY, CURRENTS, VOLTAGES] {
            assert_eq!(reg.count, 6);
        }
        assert!(CURRENTS.sentinel && VOLTAGES.sentinel);
        assert!(!PHASE_ENERGY.sentinel);
        assert!(!TOTAL_ENERGY.sentinel && !ACTIVE_POWER.sentinel);
        assert_eq!(VOLTAGES.head(2).count, 2);
        assert_eq!(VOLTAGES.head(2).address, VOLTAGES.address);
    }

    #[test]
    fn current_unit_maps_to_register() {
        assert_eq!(CurrentUnit::Amps.register().address, 1000);
        assert_eq!(CurrentUnit::Deciamps.register().address, 1001);
        assert_eq!(CurrentUnit::Deciamps.per_amp(), 10);
    }
}
