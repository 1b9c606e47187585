//! Driver registry
//!
//! The application registers the drivers it wants at startup and later
//! instantiates one by the name found in its configuration. Nothing is
//! registered implicitly.

use crate::config::Config;
use crate::device::BenderDevice;
use crate::error::{DriverError, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Future returned by a driver factory
pub type DeviceFuture = Pin<Box<dyn Future<Output = Result<BenderDevice>> + Send>>;

type Factory = Box<dyn Fn(Config) -> DeviceFuture + Send + Sync>;

/// Name to factory map of known charger drivers
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(Config) -> DeviceFuture + Send + Sync + 'static,
    {
        self.factories.insert(name.to_lowercase(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered driver names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the driver registered under `name`
    pub async fn create(&self, name: &str, config: Config) -> Result<BenderDevice> {
        let factory = self.factories.get(&name.to_lowercase()).ok_or_else(|| {
            DriverError::config(format!("unknown charger driver: {}", name))
        })?;
        factory(config).await
    }
}
