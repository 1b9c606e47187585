//! Capability-composed device handle
//!
//! [`BenderDevice`] always implements [`Charger`] and [`Diagnosis`]. Each
//! optional capability is reachable only through its accessor, which returns
//! `None` when the probe did not detect the feature.

use crate::api::{
    Battery, ChargeStatus, Charger, ChargerEx, Diagnosis, Diagnostics, Identifier, Meter,
    MeterEnergy, PhaseCurrents, PhaseGetter, PhaseSwitcher, PhaseVoltages,
};
use crate::charger::BenderCharger;
use crate::config::Config;
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use crate::modbus::ModbusClient;
use crate::probe::CapabilitySet;
use crate::registers::Layout;
use crate::transport::Transport;

/// A probed Bender charge controller
pub struct BenderDevice {
    charger: BenderCharger,
    capabilities: CapabilitySet,
}

impl BenderDevice {
    /// Connect over Modbus TCP and probe the controller.
    ///
    /// Fails only when the connection cannot be established.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = ModbusClient::connect_new(&config.modbus).await?;
        Ok(Self::probe_with_instance(Box::new(client), config.charger.device_instance).await)
    }

    /// Probe a controller reachable through `transport`.
    pub async fn probe(transport: Box<dyn Transport>) -> Self {
        Self::probe_with_instance(transport, 0).await
    }

    async fn probe_with_instance(transport: Box<dyn Transport>, device_instance: u32) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("bender").with_device_instance(device_instance),
        );
        let mut charger = BenderCharger::new(transport, logger);
        let capabilities = crate::probe::probe(&mut charger).await;
        charger.logger = charger.logger.with_field("layout", charger.layout.to_string());
        Self {
            charger,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn layout(&self) -> Layout {
        self.charger.layout
    }

    pub fn meter(&mut self) -> Option<&mut dyn Meter> {
        self.capabilities
            .metering
            .then_some(&mut self.charger as &mut dyn Meter)
    }

    pub fn meter_energy(&mut self) -> Option<&mut dyn MeterEnergy> {
        self.capabilities
            .metering
            .then_some(&mut self.charger as &mut dyn MeterEnergy)
    }

    pub fn phase_currents(&mut self) -> Option<&mut dyn PhaseCurrents> {
        self.capabilities
            .metering
            .then_some(&mut self.charger as &mut dyn PhaseCurrents)
    }

    pub fn phase_voltages(&mut self) -> Option<&mut dyn PhaseVoltages> {
        self.capabilities
            .voltages
            .then_some(&mut self.charger as &mut dyn PhaseVoltages)
    }

    pub fn battery(&mut self) -> Option<&mut dyn Battery> {
        self.capabilities
            .battery
            .then_some(&mut self.charger as &mut dyn Battery)
    }

    pub fn identifier(&mut self) -> Option<&mut dyn Identifier> {
        self.capabilities
            .identification
            .then_some(&mut self.charger as &mut dyn Identifier)
    }

    pub fn charger_ex(&mut self) -> Option<&mut dyn ChargerEx> {
        self.capabilities
            .fine_current
            .then_some(&mut self.charger as &mut dyn ChargerEx)
    }

    pub fn phase_switcher(&mut self) -> Option<&mut dyn PhaseSwitcher> {
        self.capabilities
            .phase_switching
            .then_some(&mut self.charger as &mut dyn PhaseSwitcher)
    }

    pub fn phase_getter(&mut self) -> Option<&mut dyn PhaseGetter> {
        self.capabilities
            .phase_switching
            .then_some(&mut self.charger as &mut dyn PhaseGetter)
    }
}

#[async_trait::async_trait]
impl Charger for BenderDevice {
    async fn status(&mut self) -> Result<ChargeStatus> {
        self.charger.status().await
    }

    async fn enabled(&mut self) -> Result<bool> {
        self.charger.enabled().await
    }

    async fn enable(&mut self, enable: bool) -> Result<()> {
        self.charger.enable(enable).await
    }

    async fn max_current(&mut self, current: i64) -> Result<()> {
        self.charger.max_current(current).await
    }
}

#[async_trait::async_trait]
impl Diagnosis for BenderDevice {
    async fn diagnose(&mut self) -> Diagnostics {
        self.charger.diagnose().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[tokio::test]
    async fn logger_carries_detected_layout() {
        let mock = MockTransport::default().failing(142);
        let device = BenderDevice::probe(Box::new(mock)).await;
        assert_eq!(device.layout(), Layout::Legacy);
        assert_eq!(
            device.charger.logger.context.extra_fields.get("layout"),
            Some(&"legacy".to_string())
        );
    }

    #[tokio::test]
    async fn accessors_follow_capabilities() {
        // zero voltages: metering without the OCPP meter
        let mut device = BenderDevice::probe(Box::new(MockTransport::default())).await;
        assert!(device.meter().is_some());
        assert!(device.phase_voltages().is_none());
        assert!(device.charger_ex().is_some());
    }
}
