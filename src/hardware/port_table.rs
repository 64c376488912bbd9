//! Per-port binding storage
//!
//! A fixed array with one [`PortBinding`] per smart port. The table only knows how
//! to read, write and reset slots; the rules for *when* a slot may change live in
//! the registry.

use crate::error::RegistryError;
use crate::hardware::device_type::{check_port, DeviceType, NUM_PORTS};
use crate::hardware::probe::DeviceHandle;

/// Logical assignment of a device category to a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortBinding {
    /// Bound device category (`None` when unbound)
    pub device_type: DeviceType,
    /// Hardware handle captured at bind time
    pub handle: Option<DeviceHandle>,
}

impl PortBinding {
    /// The unbound slot value
    pub const UNBOUND: PortBinding = PortBinding {
        device_type: DeviceType::None,
        handle: None,
    };

    /// Binding for a device type with its hardware handle
    pub const fn new(device_type: DeviceType, handle: Option<DeviceHandle>) -> Self {
        Self {
            device_type,
            handle,
        }
    }

    /// True if nothing is bound
    pub fn is_unbound(&self) -> bool {
        self.device_type == DeviceType::None
    }
}

/// Fixed table of bindings, one slot per port
#[derive(Debug, Clone)]
pub struct PortTable {
    slots: [PortBinding; NUM_PORTS],
}

impl PortTable {
    /// Table with every slot unbound
    pub const fn new() -> Self {
        Self {
            slots: [PortBinding::UNBOUND; NUM_PORTS],
        }
    }

    /// Read a slot
    pub fn get(&self, port: usize) -> Result<PortBinding, RegistryError> {
        Ok(self.slots[check_port(port)?])
    }

    /// Overwrite a slot
    pub fn set(&mut self, port: usize, binding: PortBinding) -> Result<(), RegistryError> {
        self.slots[check_port(port)?] = binding;
        Ok(())
    }

    /// Reset a slot to unbound
    pub fn reset(&mut self, port: usize) -> Result<(), RegistryError> {
        self.set(port, PortBinding::UNBOUND)
    }

    /// Copy of every slot
    pub fn slots(&self) -> [PortBinding; NUM_PORTS] {
        self.slots
    }
}

impl Default for PortTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_unbound() {
        let table = PortTable::new();
        assert!(table.slots().iter().all(PortBinding::is_unbound));
        assert!(table.slots().iter().all(|b| b.handle.is_none()));
    }

    #[test]
    fn test_set_and_reset() {
        let mut table = PortTable::new();
        let handle = DeviceHandle::from_raw(7);
        table.set(3, PortBinding::new(DeviceType::Imu, handle)).unwrap();
        assert_eq!(table.get(3).unwrap().device_type, DeviceType::Imu);
        assert_eq!(table.get(3).unwrap().handle, handle);

        table.reset(3).unwrap();
        assert_eq!(table.get(3).unwrap(), PortBinding::UNBOUND);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut table = PortTable::new();
        assert_eq!(
            table.get(NUM_PORTS),
            Err(RegistryError::InvalidPort { port: NUM_PORTS })
        );
        assert!(table
            .set(NUM_PORTS + 3, PortBinding::new(DeviceType::Motor, None))
            .is_err());
        assert!(table.reset(usize::MAX).is_err());
        assert!(table.slots().iter().all(PortBinding::is_unbound));
    }
}
