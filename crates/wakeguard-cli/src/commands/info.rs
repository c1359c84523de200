use serde::Serialize;
use wakeguard_core::{format_hms, Result};
use wakeguard_core::platform::sim::SimulatedPlatform;
use wakeguard_core::platform::LockCapability;

#[derive(Serialize)]
struct HostInfo {
    os: &'static str,
    os_family: &'static str,
    arch: &'static str,
    version: &'static str,
    lock_backend: &'static str,
    lock_supported: bool,
}

/// Host identification and screen lock support.
pub fn run() -> Result<()> {
    let backend = SimulatedPlatform::new();
    let info = HostInfo {
        os: std::env::consts::OS,
        os_family: std::env::consts::FAMILY,
        arch: std::env::consts::ARCH,
        version: env!("CARGO_PKG_VERSION"),
        lock_backend: "simulated",
        lock_supported: backend.is_supported(),
    };
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

pub fn format(seconds: u64) -> Result<()> {
    println!("{}", format_hms(seconds));
    Ok(())
}
