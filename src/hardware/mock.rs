//! Mock Hardware Probe
//!
//! Provides a simulated controller for testing without physical hardware.
//! Devices are "plugged" and "unplugged" by writing raw hardware codes into a
//! per-port table; every scan returns a copy of that table.
//!
//! # Performance Characteristics
//!
//! - Scans complete immediately unless a latency is configured, in which case
//!   each scan sleeps with `tokio::time::sleep` to mimic a bus transaction.
//! - Handle lookups never block on the scan.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::SimulationConfig;
use crate::error::{AppResult, RegistryError};
use crate::hardware::device_type::{check_port, index_from_port_number, DeviceType, NUM_PORTS};
use crate::hardware::probe::{DeviceHandle, HardwareProbe};

/// Base address of the simulated per-port device records
const HANDLE_BASE: usize = 0x1000;
/// Size of one simulated device record
const HANDLE_STRIDE: usize = 0x40;

/// Simulated controller with a writable plug table
///
/// # Example
///
/// ```rust,ignore
/// let probe = MockProbe::new();
/// probe.plug(4, DeviceType::Imu)?;
/// let codes = probe.snapshot_codes().await;
/// assert_eq!(codes[4], DeviceType::Imu.code());
/// ```
#[derive(Debug)]
pub struct MockProbe {
    codes: RwLock<[u8; NUM_PORTS]>,
    scan_latency: Duration,
    scans: AtomicUsize,
}

impl MockProbe {
    /// Create a probe with nothing plugged in
    pub fn new() -> Self {
        Self {
            codes: RwLock::new([DeviceType::None.code(); NUM_PORTS]),
            scan_latency: Duration::ZERO,
            scans: AtomicUsize::new(0),
        }
    }

    /// Create a probe with devices already plugged in
    ///
    /// # Arguments
    /// * `devices` - `(port index, device type)` pairs
    pub fn with_devices<I>(devices: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (usize, DeviceType)>,
    {
        let probe = Self::new();
        for (port, device) in devices {
            probe.plug(port, device)?;
        }
        Ok(probe)
    }

    /// Build a probe from the `[simulation]` configuration section
    pub fn from_config(config: &SimulationConfig) -> AppResult<Self> {
        let mut probe = Self::new();
        probe.scan_latency = Duration::from_millis(config.scan_latency_ms);
        for entry in &config.ports {
            probe.plug(index_from_port_number(entry.port)?, entry.device)?;
        }
        Ok(probe)
    }

    /// Simulate a bus transaction of the given duration on every scan
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.scan_latency = latency;
        self
    }

    /// Plug a device into a port
    pub fn plug(&self, port: usize, device: DeviceType) -> Result<(), RegistryError> {
        self.plug_code(port, device.code())
    }

    /// Report an arbitrary raw code on a port (including unknown codes)
    pub fn plug_code(&self, port: usize, code: u8) -> Result<(), RegistryError> {
        let port = check_port(port)?;
        self.codes.write()[port] = code;
        Ok(())
    }

    /// Remove whatever is plugged into a port
    pub fn unplug(&self, port: usize) -> Result<(), RegistryError> {
        self.plug(port, DeviceType::None)
    }

    /// Number of scans performed so far
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }
}

impl Default for MockProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HardwareProbe for MockProbe {
    async fn snapshot_codes(&self) -> [u8; NUM_PORTS] {
        if !self.scan_latency.is_zero() {
            tokio::time::sleep(self.scan_latency).await;
        }
        self.scans.fetch_add(1, Ordering::Relaxed);
        *self.codes.read()
    }

    fn handle_at(&self, port: usize) -> Option<DeviceHandle> {
        if port >= NUM_PORTS {
            return None;
        }
        DeviceHandle::from_raw(HANDLE_BASE + port * HANDLE_STRIDE)
    }
}
