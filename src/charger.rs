//! Register-level operations of the Bender charge controller
//!
//! `BenderCharger` owns the transport and implements every operation the
//! controller may support. It is crate-private: callers reach the optional
//! operations only through [`BenderDevice`](crate::device::BenderDevice),
//! which hands them out according to the probed capabilities.

use crate::api::{
    Battery, ChargeStatus, Charger, ChargerEx, Diagnosis, Diagnostics, Identifier, Meter,
    MeterEnergy, PhaseCurrents, PhaseGetter, PhaseSwitcher, PhaseVoltages,
};
use crate::codec::{RegisterValue, decode, decode_u16, decode_u32, encode_u16};
use crate::config::Config;
use crate::device::BenderDevice;
use crate::error::{DriverError, Result};
use crate::logging::StructuredLogger;
use crate::registers::{self, CurrentUnit, Layout, Register};
use crate::registry::Registry;
use crate::transport::Transport;

/// Name under which [`register`] adds this driver
pub const DRIVER_NAME: &str = "bender";

/// Add the Bender driver to `registry`
///
/// The factory connects a [`ModbusClient`](crate::modbus::ModbusClient) using
/// the `modbus` section of the configuration and probes the device.
pub fn register(registry: &mut Registry) {
    registry.register(DRIVER_NAME, |config: Config| {
        Box::pin(async move { BenderDevice::connect(&config).await })
    });
}

pub(crate) struct BenderCharger {
    transport: Box<dyn Transport>,
    pub(crate) layout: Layout,
    /// Unit (and thereby register) of the active current limit
    pub(crate) current_unit: CurrentUnit,
    /// Last commanded current in `current_unit`
    pub(crate) current: u16,
    pub(crate) logger: StructuredLogger,
}

impl BenderCharger {
    pub(crate) fn new(transport: Box<dyn Transport>, logger: StructuredLogger) -> Self {
        Self {
            transport,
            layout: Layout::Current,
            current_unit: CurrentUnit::Amps,
            current: registers::MIN_CURRENT,
            logger,
        }
    }

    /// Switch the active current limit to the 0.1 A register
    pub(crate) fn use_fine_current(&mut self) {
        if self.current_unit == CurrentUnit::Amps {
            self.current_unit = CurrentUnit::Deciamps;
            self.current = self.current.saturating_mul(CurrentUnit::Deciamps.per_amp());
        }
    }

    pub(crate) async fn read(&mut self, reg: Register) -> Result<Vec<u16>> {
        self.transport.read_registers(reg.address, reg.count).await
    }

    pub(crate) async fn read_u16(&mut self, reg: Register) -> Result<u16> {
        decode_u16(&self.read(reg).await?)
    }

    pub(crate) async fn read_u32(&mut self, reg: Register) -> Result<u32> {
        decode_u32(&self.read(reg).await?)
    }

    /// Read `reg` and decode it as its catalog entry describes
    async fn read_value(&mut self, reg: Register) -> Result<RegisterValue> {
        decode(reg, &self.read(reg).await?)
    }

    async fn read_number(&mut self, reg: Register) -> Result<f64> {
        let value = self.read_value(reg).await?;
        value.number().ok_or_else(|| unexpected(reg, &value))
    }

    async fn read_triplet(&mut self, reg: Register) -> Result<(f64, f64, f64)> {
        let value = self.read_value(reg).await?;
        let [l1, l2, l3] = value.triplet().ok_or_else(|| unexpected(reg, &value))?;
        Ok((l1, l2, l3))
    }

    async fn read_text(&mut self, reg: Register) -> Result<String> {
        match self.read_value(reg).await? {
            RegisterValue::Text(text) => Ok(text),
            other => Err(unexpected(reg, &other)),
        }
    }

    async fn write_u16(&mut self, reg: Register, value: u16) -> Result<()> {
        self.transport
            .write_registers(reg.address, &encode_u16(value))
            .await
    }

    fn active_current_register(&self) -> Register {
        self.current_unit.register()
    }

    async fn smart_vehicle_detected(&mut self) -> Result<u16> {
        self.read_u16(registers::SMART_VEHICLE_DETECTED).await
    }
}

fn unexpected(reg: Register, value: &RegisterValue) -> DriverError {
    DriverError::protocol(format!("{}: unexpected value {}", reg.name, value))
}

#[async_trait::async_trait]
impl Charger for BenderCharger {
    async fn status(&mut self) -> Result<ChargeStatus> {
        match self.read_u16(registers::CHARGE_POINT_STATE).await? {
            1 => Ok(ChargeStatus::NotConnected),
            2 => Ok(ChargeStatus::Connected),
            3 | 4 => Ok(ChargeStatus::Charging),
            s => Err(DriverError::protocol(format!("invalid status: {}", s))),
        }
    }

    async fn enabled(&mut self) -> Result<bool> {
        let reg = self.active_current_register();
        Ok(self.read_u16(reg).await? != 0)
    }

    async fn enable(&mut self, enable: bool) -> Result<()> {
        let value = if enable { self.current } else { 0 };
        let reg = self.active_current_register();
        self.write_u16(reg, value).await
    }

    async fn max_current(&mut self, current: i64) -> Result<()> {
        if current < i64::from(registers::MIN_CURRENT) {
            return Err(DriverError::validation(
                "current".to_string(),
                format!("invalid current {}", current),
            ));
        }
        // The cached value must also fit the active register
        let amps = u16::try_from(current).ok();
        let cached = amps.and_then(|a| a.checked_mul(self.current_unit.per_amp()));
        let (Some(amps), Some(cached)) = (amps, cached) else {
            return Err(DriverError::validation(
                "current".to_string(),
                format!("current {} out of range", current),
            ));
        };

        self.write_u16(registers::HEMS_CURRENT_LIMIT, amps).await?;
        self.current = cached;
        self.logger.debug(&format!("Current limit set to {} A", amps));
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChargerEx for BenderCharger {
    async fn max_current_millis(&mut self, current: f64) -> Result<()> {
        // Negated comparison also rejects NaN
        if !(current >= f64::from(registers::MIN_CURRENT)) {
            return Err(DriverError::validation(
                "current".to_string(),
                format!("invalid current {:.5}", current),
            ));
        }
        let tenths = (current * 10.0).trunc();
        if tenths > f64::from(u16::MAX) {
            return Err(DriverError::validation(
                "current".to_string(),
                format!("current {:.5} out of range", current),
            ));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let curr = tenths as u16;

        self.write_u16(registers::HEMS_CURRENT_LIMIT_10, curr).await?;
        self.current = curr;
        self.logger.debug(&format!("Current limit set to {} x 0.1 A", curr));
        Ok(())
    }
}

#[async_trait::async_trait]
impl Meter for BenderCharger {
    async fn current_power(&mut self) -> Result<f64> {
        if self.layout.is_legacy() {
            let (l1, l2, l3) = self.currents().await?;
            return Ok(registers::NOMINAL_VOLTAGE * (l1 + l2 + l3));
        }

        self.read_number(registers::ACTIVE_POWER).await
    }
}

#[async_trait::async_trait]
impl MeterEnergy for BenderCharger {
    async fn total_energy(&mut self) -> Result<f64> {
        if self.layout.is_legacy() {
            let (l1, l2, l3) = self.read_triplet(registers::PHASE_ENERGY).await?;
            return Ok(l1 + l2 + l3);
        }

        self.read_number(registers::TOTAL_ENERGY).await
    }
}

#[async_trait::async_trait]
impl PhaseCurrents for BenderCharger {
    async fn currents(&mut self) -> Result<(f64, f64, f64)> {
        self.read_triplet(registers::CURRENTS).await
    }
}

#[async_trait::async_trait]
impl PhaseVoltages for BenderCharger {
    async fn voltages(&mut self) -> Result<(f64, f64, f64)> {
        self.read_triplet(registers::VOLTAGES).await
    }
}

#[async_trait::async_trait]
impl Battery for BenderCharger {
    async fn soc(&mut self) -> Result<f64> {
        if self.smart_vehicle_detected().await? == 1 {
            let soc = self.read_u16(registers::EV_BATTERY_STATE).await?;
            if soc <= 100 {
                return Ok(f64::from(soc));
            }
        }

        Err(DriverError::NotAvailable)
    }
}

#[async_trait::async_trait]
impl Identifier for BenderCharger {
    async fn identify(&mut self) -> Result<String> {
        if !self.layout.is_legacy() && self.smart_vehicle_detected().await? != 0 {
            let id = self.read_text(registers::EVCCID).await?;
            if !id.is_empty() {
                return Ok(id);
            }
        }

        self.read_text(registers::USER_ID).await
    }
}

#[async_trait::async_trait]
impl PhaseSwitcher for BenderCharger {
    async fn phases_1p3p(&mut self, phases: u8) -> Result<()> {
        let limit = match phases {
            1 => registers::POWER_LIMIT_1P,
            3 => registers::POWER_LIMIT_3P,
            n => {
                return Err(DriverError::validation(
                    "phases".to_string(),
                    format!("invalid phases {}", n),
                ));
            }
        };

        self.write_u16(registers::HEMS_POWER_LIMIT, limit).await?;
        self.logger.debug(&format!("Switched to {}p", phases));
        Ok(())
    }
}

#[async_trait::async_trait]
impl PhaseGetter for BenderCharger {
    async fn get_phases(&mut self) -> Result<u8> {
        if self.read_u16(registers::HEMS_POWER_LIMIT).await? <= registers::POWER_LIMIT_1P {
            return Ok(1);
        }
        Ok(3)
    }
}

#[async_trait::async_trait]
impl Diagnosis for BenderCharger {
    async fn diagnose(&mut self) -> Diagnostics {
        let mut d = Diagnostics::default();
        let legacy = self.layout.is_legacy();

        d.push("Legacy", legacy);
        if !legacy && let Ok(model) = self.read_text(registers::CHARGE_POINT_MODEL).await {
            d.push("Model", model);
        }
        if let Ok(firmware) = self.read_text(registers::FIRMWARE).await {
            d.push("Firmware", firmware);
        }
        if let Ok(protocol) = self.read_text(registers::PROTOCOL_VERSION).await {
            d.push("Protocol", protocol);
        }
        if let Ok(v) = self.read_u16(registers::OCPP_CP_STATUS).await {
            d.push("OCPP Status", v);
        }
        if !legacy && let Ok(v) = self.smart_vehicle_detected().await {
            d.push("Smart Vehicle", v != 0);
        }
        if let Ok(evccid) = self.read_text(registers::EVCCID).await {
            d.push("EVCCID", evccid);
        }
        if let Ok(user_id) = self.read_text(registers::USER_ID).await {
            d.push("UserID", user_id);
        }
        let reg = self.active_current_register();
        if let Ok(v) = self.read_u16(reg).await {
            d.push("Current Limit", v);
        }

        for (label, value) in d.entries() {
            self.logger.debug(&format!("{}: {}", label, value));
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::get_logger;
    use crate::transport::mock::MockTransport;

    fn charger(mock: &MockTransport, layout: Layout) -> BenderCharger {
        let mut c = BenderCharger::new(Box::new(mock.clone()), get_logger("charger"));
        c.layout = layout;
        c
    }

    #[tokio::test]
    async fn status_rejects_unknown_codes() {
        for raw in [0u16, 5, 0xFFFF] {
            let mock = MockTransport::default().with(122, &[raw]);
            let err = charger(&mock, Layout::Current).status().await.unwrap_err();
            assert!(matches!(err, DriverError::Protocol { .. }), "raw {}", raw);
            assert!(err.to_string().contains("invalid status"));
        }
    }

    #[tokio::test]
    async fn max_current_rejects_out_of_range_without_io() {
        let mock = MockTransport::default();
        let mut c = charger(&mock, Layout::Current);
        assert!(c.max_current(70_000).await.is_err());
        assert!(c.max_current(-1).await.is_err());
        assert!(mock.writes().is_empty());
        assert!(mock.state.lock().unwrap().reads.is_empty());
    }

    #[tokio::test]
    async fn failed_write_keeps_cached_current() {
        let mock = MockTransport::default().failing(1000);
        let mut c = charger(&mock, Layout::Current);
        assert!(c.max_current(16).await.unwrap_err().is_transport());
        assert_eq!(c.current, 6);
    }

    #[tokio::test]
    async fn max_current_rejects_values_not_representable_in_tenths() {
        let mock = MockTransport::default();
        let mut c = charger(&mock, Layout::Current);
        c.use_fine_current();

        let err = c.max_current(7000).await.unwrap_err();
        assert!(matches!(err, DriverError::Validation { .. }));
        assert!(mock.writes().is_empty());
        assert_eq!(c.current, 60);

        // the same value is fine while whole amps are active
        let mut c = charger(&mock, Layout::Current);
        c.max_current(7000).await.unwrap();
        assert_eq!(c.current, 7000);

        c.use_fine_current();
        c.max_current(6553).await.unwrap();
        assert_eq!(c.current, 65_530);
    }

    #[tokio::test]
    async fn max_current_is_cached_in_tenths_when_fine_control_active() {
        let mock = MockTransport::default();
        let mut c = charger(&mock, Layout::Current);
        c.use_fine_current();
        assert_eq!(c.current, 60);

        c.max_current(16).await.unwrap();
        c.enable(true).await.unwrap();
        assert_eq!(mock.writes(), vec![(1000, vec![16]), (1001, vec![160])]);
    }

    #[tokio::test]
    async fn max_current_millis_truncates_to_tenths() {
        let mock = MockTransport::default();
        let mut c = charger(&mock, Layout::Current);
        c.use_fine_current();
        c.max_current_millis(7.68).await.unwrap();
        assert_eq!(mock.writes(), vec![(1001, vec![76])]);
        assert_eq!(c.current, 76);

        assert!(c.max_current_millis(f64::NAN).await.is_err());
        assert!(c.max_current_millis(5.99).await.is_err());
        assert_eq!(mock.writes().len(), 1);
    }

    #[tokio::test]
    async fn legacy_power_uses_nominal_voltage() {
        // 6 A, 7 A and 8 A in mA
        let mock = MockTransport::default()
            .with_u32(212, 6000)
            .with_u32(214, 7000)
            .with_u32(216, 8000);
        let power = charger(&mock, Layout::Legacy).current_power().await.unwrap();
        assert!((power - 230.0 * 21.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn current_power_reads_active_power() {
        let mock = MockTransport::default().with_u32(220, 11_040);
        let power = charger(&mock, Layout::Current).current_power().await.unwrap();
        assert!((power - 11_040.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn phases_1p3p_writes_power_limit() {
        let mock = MockTransport::default();
        let mut c = charger(&mock, Layout::Current);
        c.phases_1p3p(1).await.unwrap();
        c.phases_1p3p(3).await.unwrap();
        assert!(c.phases_1p3p(2).await.is_err());
        assert_eq!(mock.writes(), vec![(1002, vec![3725]), (1002, vec![0xFFFF])]);
    }

    #[tokio::test]
    async fn get_phases_threshold() {
        for (raw, expected) in [(0u16, 1u8), (3725, 1), (3726, 3), (0xFFFF, 3)] {
            let mock = MockTransport::default().with(1002, &[raw]);
            let phases = charger(&mock, Layout::Current).get_phases().await.unwrap();
            assert_eq!(phases, expected, "raw {}", raw);
        }
    }

    #[tokio::test]
    async fn soc_rejects_values_above_100() {
        let mock = MockTransport::default().with(740, &[1]).with(730, &[101]);
        let err = charger(&mock, Layout::Current).soc().await.unwrap_err();
        assert!(err.is_not_available());

        let mock = MockTransport::default().with(740, &[1]).with(730, &[80]);
        let soc = charger(&mock, Layout::Current).soc().await.unwrap();
        assert!((soc - 80.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn legacy_total_energy_rejects_short_read() {
        struct Short;

        #[async_trait::async_trait]
        impl Transport for Short {
            async fn read_registers(&mut self, _: u16, _: u16) -> Result<Vec<u16>> {
                Ok(vec![0, 1000, 0, 2000])
            }

            async fn write_registers(&mut self, _: u16, _: &[u16]) -> Result<()> {
                Ok(())
            }
        }

        let mut c = BenderCharger::new(Box::new(Short), get_logger("charger"));
        c.layout = Layout::Legacy;
        let err = c.total_energy().await.unwrap_err();
        assert!(matches!(err, DriverError::Protocol { .. }));
        assert!(err.to_string().contains("phase_energy"));
    }

    #[tokio::test]
    async fn identify_returns_evccid_read_error() {
        let mock = MockTransport::default().with(740, &[1]).failing(741);
        let err = charger(&mock, Layout::Current).identify().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn identify_propagates_flag_read_error() {
        let mock = MockTransport::default().failing(740);
        let err = charger(&mock, Layout::Current).identify().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn identify_on_legacy_reads_user_id_only() {
        let mock = MockTransport::default()
            .failing(740)
            .with(720, &[0x3034, 0x4146, 0x3132, 0, 0, 0, 0, 0, 0, 0]);
        let id = charger(&mock, Layout::Legacy).identify().await.unwrap();
        assert_eq!(id, "04AF12");
    }

    #[tokio::test]
    async fn diagnose_skips_failing_fields() {
        let mock = MockTransport::default()
            .with(100, &[0x352E, 0x3231])
            .failing(120)
            .failing(741)
            .with(1000, &[16]);
        let d = charger(&mock, Layout::Legacy).diagnose().await;
        assert_eq!(d.get("Legacy"), Some("true"));
        assert_eq!(d.get("Firmware"), Some("5.21"));
        assert_eq!(d.get("Protocol"), None);
        assert_eq!(d.get("EVCCID"), None);
        assert_eq!(d.get("Model"), None);
        assert_eq!(d.get("Smart Vehicle"), None);
        assert_eq!(d.get("Current Limit"), Some("16"));
    }
}
