use anyhow::Result;
use bender_cc::{Charger, Config, Diagnosis, Registry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    bender_cc::logging::init_logging(&config.logging)?;
    info!("bender-cc {} starting up", env!("APP_VERSION"));

    let mut registry = Registry::new();
    bender_cc::charger::register(&mut registry);

    let driver = config.charger.driver.clone();
    let mut device = registry
        .create(&driver, config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create charger '{}': {}", driver, e))?;

    println!("Layout:\t\t{}", device.layout());
    println!("Capabilities:\t{}", device.capabilities());

    match device.status().await {
        Ok(status) => println!("Status:\t\t{}", status),
        Err(e) => warn!("Status unavailable: {}", e),
    }
    match device.enabled().await {
        Ok(enabled) => println!("Enabled:\t{}", enabled),
        Err(e) => warn!("Enabled state unavailable: {}", e),
    }
    if let Some(meter) = device.meter() {
        match meter.current_power().await {
            Ok(power) => println!("Power:\t\t{} W", power),
            Err(e) => warn!("Power unavailable: {}", e),
        }
    }
    if let Some(battery) = device.battery() {
        match battery.soc().await {
            Ok(soc) => println!("SoC:\t\t{} %", soc),
            Err(e) if e.is_not_available() => println!("SoC:\t\t-"),
            Err(e) => warn!("SoC unavailable: {}", e),
        }
    }

    print!("{}", device.diagnose().await);
    Ok(())
}
