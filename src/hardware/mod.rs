//! Smart-Port Hardware Layer
//!
//! Device categories, the hardware probe boundary, the binding table and the
//! registry that reconciles them.

pub mod device_type;
pub mod mock;
pub mod port_table;
pub mod probe;
pub mod registry;
pub mod throttle;

pub use device_type::{index_from_port_number, port_number, DeviceType, NUM_PORTS};
pub use mock::MockProbe;
pub use port_table::{PortBinding, PortTable};
pub use probe::{DeviceHandle, HardwareProbe, PlugSnapshot};
pub use registry::{PortRegistry, PortStatus, ValidationOutcome};
pub use throttle::{PortWarningFlags, WarningResetPolicy, WarningThrottle};
