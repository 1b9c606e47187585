#![allow(dead_code)]

use bender_cc::error::{DriverError, Result};
use bender_cc::transport::Transport;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct RegisterMap {
    pub registers: HashMap<u16, u16>,
    pub failing: HashSet<u16>,
    pub writes: Vec<(u16, Vec<u16>)>,
}

/// Simulated controller: unknown addresses read as zero, failing addresses
/// answer with a transport error as an illegal-address exception would.
#[derive(Clone, Default)]
pub struct SimulatedCharger {
    pub map: Arc<Mutex<RegisterMap>>,
}

impl SimulatedCharger {
    pub fn set(self, address: u16, values: &[u16]) -> Self {
        {
            let mut map = self.map.lock().unwrap();
            for (i, v) in values.iter().enumerate() {
                map.registers.insert(address + i as u16, *v);
            }
        }
        self
    }

    pub fn set_u32(self, address: u16, value: u32) -> Self {
        self.set(address, &[(value >> 16) as u16, value as u16])
    }

    pub fn set_text(self, address: u16, count: u16, text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(count as usize * 2, 0);
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .collect();
        self.set(address, &words)
    }

    pub fn fail(self, addresses: &[u16]) -> Self {
        self.map.lock().unwrap().failing.extend(addresses);
        self
    }

    pub fn writes(&self) -> Vec<(u16, Vec<u16>)> {
        self.map.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.map.lock().unwrap().writes.clear();
    }

    pub fn boxed(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}

#[async_trait::async_trait]
impl Transport for SimulatedCharger {
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>> {
        let map = self.map.lock().unwrap();
        let range = address..address + count;
        if range.clone().any(|a| map.failing.contains(&a)) {
            return Err(DriverError::transport("exception: IllegalDataAddress"));
        }
        Ok(range
            .map(|a| map.registers.get(&a).copied().unwrap_or_default())
            .collect())
    }

    async fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<()> {
        let mut map = self.map.lock().unwrap();
        if map.failing.contains(&address) {
            return Err(DriverError::transport("exception: IllegalDataAddress"));
        }
        map.writes.push((address, values.to_vec()));
        for (i, v) in values.iter().enumerate() {
            map.registers.insert(address + i as u16, *v);
        }
        Ok(())
    }
}

/// Current-layout controller with every optional feature present
pub fn full_featured() -> SimulatedCharger {
    SimulatedCharger::default()
        .set_text(142, 10, "CC613")
        .set_u32(220, 4140)
        .set_u32(222, 230)
        .set_u32(224, 231)
        .set_u32(226, 229)
        .set(730, &[55])
        .set(1001, &[160])
        .set(1002, &[0xFFFF])
}

/// Every optional probe fails; only the mandatory registers answer
pub fn bare() -> SimulatedCharger {
    SimulatedCharger::default()
        .set_u32(220, u32::MAX)
        .set_u32(200, u32::MAX)
        .fail(&[1001, 1002, 720, 740])
}
