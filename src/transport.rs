//! Register transport seam
//!
//! The driver never talks to a socket directly; it issues register
//! transactions through [`Transport`]. Addresses and counts are in 16-bit
//! register units and each word is one big-endian register.

use crate::error::Result;

#[async_trait::async_trait]
pub trait Transport: Send {
    /// Read `count` holding registers starting at `address`.
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>>;

    /// Write `values` to consecutive holding registers starting at `address`.
    async fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<()>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>> {
        (**self).read_registers(address, count).await
    }

    async fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<()> {
        (**self).write_registers(address, values).await
    }
}
