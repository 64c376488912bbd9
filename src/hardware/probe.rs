//! Hardware probe boundary
//!
//! The probe is the registry's view of the physical world. It reports, per port,
//! which device category is currently plugged in, and hands out an opaque handle
//! for direct hardware access. The registry treats both as ground truth and never
//! writes back to the probe.
//!
//! Scanning may involve a bus transaction, so [`HardwareProbe::snapshot_codes`] is
//! async. Handle lookup is a table read and stays synchronous so it can be called
//! while the registry holds its lock.

use crate::hardware::device_type::{DeviceType, NUM_PORTS};
use async_trait::async_trait;
use std::num::NonZeroUsize;

/// Opaque reference to a device's hardware record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(NonZeroUsize);

impl DeviceHandle {
    /// Wrap a raw hardware reference (zero is the null reference)
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    /// Raw hardware reference
    pub fn raw(&self) -> usize {
        self.0.get()
    }
}

/// Source of plug information and hardware handles
#[async_trait]
pub trait HardwareProbe: Send + Sync {
    /// Scan every port and return the raw device code found on each
    async fn snapshot_codes(&self) -> [u8; NUM_PORTS];

    /// Hardware handle for a port (no I/O)
    fn handle_at(&self, port: usize) -> Option<DeviceHandle>;
}

/// Device types observed on every port by one probe scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlugSnapshot {
    types: [DeviceType; NUM_PORTS],
}

impl PlugSnapshot {
    /// Snapshot with nothing plugged anywhere
    pub const fn empty() -> Self {
        Self {
            types: [DeviceType::None; NUM_PORTS],
        }
    }

    /// Decode raw hardware codes into a snapshot
    pub fn from_codes(codes: &[u8; NUM_PORTS]) -> Self {
        let mut types = [DeviceType::None; NUM_PORTS];
        for (slot, code) in types.iter_mut().zip(codes) {
            *slot = DeviceType::from_code(*code);
        }
        Self { types }
    }

    /// Device type on a port, `None` if the index is out of range
    pub fn get(&self, port: usize) -> Option<DeviceType> {
        self.types.get(port).copied()
    }

    /// Iterate `(port, type)` over every port
    pub fn iter(&self) -> impl Iterator<Item = (usize, DeviceType)> + '_ {
        self.types.iter().copied().enumerate()
    }

    /// Ports that have something plugged in
    pub fn occupied(&self) -> impl Iterator<Item = (usize, DeviceType)> + '_ {
        self.iter().filter(|(_, ty)| *ty != DeviceType::None)
    }
}

impl Default for PlugSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
