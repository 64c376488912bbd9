//! Port Registry for Runtime Smart-Port Management
//!
//! The registry keeps track of which device category each smart port is expected
//! to carry, and reconciles that with what the hardware probe says is physically
//! plugged in. Devices must be bound before use; validation binds them
//! automatically when a port is unbound and something is present.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        PortRegistry                             │
//! │   initialize | bind | unbind | queries | validate               │
//! ├──────────────────────────────┬──────────────────────────────────┤
//! │  Mutex<RegistryState>        │  WarningThrottle                 │
//! │   PortTable + PlugSnapshot   │   one latch per port             │
//! ├──────────────────────────────┴──────────────────────────────────┤
//! │                        HardwareProbe                            │
//! │   snapshot_codes (async scan) | handle_at (table lookup)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Locking
//!
//! One mutex guards the binding table and the cached plug snapshot. Every
//! check-then-write sequence (`bind`, the auto-bind step of `validate`) runs
//! under that lock, so two callers can never both observe an unbound port and
//! both succeed. Probe scans are awaited *before* the lock is taken; only the
//! copy of the result happens under it.
//!
//! # Ports
//!
//! All operations take 0-based port indices. Log messages present ports
//! 1-based, as printed on the controller.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use port_registry::hardware::{DeviceType, MockProbe, PortRegistry, ValidationOutcome};
//! use std::sync::Arc;
//!
//! let probe = Arc::new(MockProbe::with_devices([(5, DeviceType::Optical)])?);
//! let registry = PortRegistry::with_probe(probe);
//! registry.initialize().await;
//!
//! assert_eq!(registry.validate(5, DeviceType::Optical)?, ValidationOutcome::Consistent);
//! registry.bind(2, DeviceType::Motor)?;
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::RegistryError;
use crate::hardware::device_type::{check_port, index_from_port_number, port_number, DeviceType, NUM_PORTS};
use crate::hardware::port_table::{PortBinding, PortTable};
use crate::hardware::probe::{DeviceHandle, HardwareProbe, PlugSnapshot};
use crate::hardware::throttle::{PortWarningFlags, WarningResetPolicy, WarningThrottle};

// =============================================================================
// Validation Outcome
// =============================================================================

/// Result of reconciling a port's binding against the plugged device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationOutcome {
    /// Binding, plugged device and expectation agree
    Consistent,
    /// Nothing is plugged into the port
    NothingPlugged,
    /// Something other than the expected or bound device is plugged in
    Mismatch,
}

impl ValidationOutcome {
    /// Numeric outcome code (0 consistent, 1 nothing plugged, 2 mismatch)
    pub const fn code(&self) -> i32 {
        match self {
            ValidationOutcome::Consistent => 0,
            ValidationOutcome::NothingPlugged => 1,
            ValidationOutcome::Mismatch => 2,
        }
    }

    /// True for [`ValidationOutcome::Consistent`]
    pub const fn is_consistent(&self) -> bool {
        matches!(self, ValidationOutcome::Consistent)
    }

    /// Short label for reports
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValidationOutcome::Consistent => "ok",
            ValidationOutcome::NothingPlugged => "nothing plugged",
            ValidationOutcome::Mismatch => "mismatch",
        }
    }
}

// =============================================================================
// Port Status (for introspection)
// =============================================================================

/// Bound and plugged state of one port (returned by [`PortRegistry::status_report`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PortStatus {
    /// 1-based port number
    pub port: usize,
    /// Bound device type
    pub bound: DeviceType,
    /// Plugged device type from the latest scan
    pub plugged: DeviceType,
    /// Raw hardware handle, if any
    pub handle: Option<usize>,
}

// =============================================================================
// Port Registry
// =============================================================================

struct RegistryState {
    table: PortTable,
    snapshot: PlugSnapshot,
    /// Fault reported by the latest `validate` of each port
    last_fault: [Option<ValidationOutcome>; NUM_PORTS],
}

/// Central registry for smart-port bindings
///
/// Constructed once and shared (usually behind an `Arc`) by every task that
/// talks to port devices.
pub struct PortRegistry {
    probe: Arc<dyn HardwareProbe>,
    throttle: Arc<dyn WarningThrottle>,
    reset_policy: WarningResetPolicy,
    state: Mutex<RegistryState>,
}

impl PortRegistry {
    /// Create a registry with every port unbound
    ///
    /// Nothing is read from the probe until [`PortRegistry::initialize`] or
    /// [`PortRegistry::refresh_plug_snapshot`] is called.
    pub fn new(
        probe: Arc<dyn HardwareProbe>,
        throttle: Arc<dyn WarningThrottle>,
        reset_policy: WarningResetPolicy,
    ) -> Self {
        Self {
            probe,
            throttle,
            reset_policy,
            state: Mutex::new(RegistryState {
                table: PortTable::new(),
                snapshot: PlugSnapshot::empty(),
                last_fault: [None; NUM_PORTS],
            }),
        }
    }

    /// Create a registry with the default warning flags and reset policy
    pub fn with_probe(probe: Arc<dyn HardwareProbe>) -> Self {
        Self::new(
            probe,
            Arc::new(PortWarningFlags::new()),
            WarningResetPolicy::default(),
        )
    }

    /// Seed every binding from a fresh probe scan
    ///
    /// Whatever is plugged in right now becomes the initial binding. This path
    /// skips the conflict checks of [`PortRegistry::bind`]. Ports reporting an
    /// unrecognized code are left unbound. Every port keeps the handle the probe
    /// reports for it, occupied or not.
    pub async fn initialize(&self) {
        info!("Initializing registry");
        let snapshot = self.scan().await;

        let mut state = self.state.lock();
        state.snapshot = snapshot;
        for (port, plugged) in snapshot.iter() {
            let device_type = if plugged == DeviceType::Undefined {
                warn!(port = port_number(port), "Unrecognized device in port {}", port_number(port));
                DeviceType::None
            } else {
                plugged
            };
            let binding = PortBinding::new(device_type, self.probe.handle_at(port));
            // port comes from the snapshot, always in range
            let _ = state.table.set(port, binding);

            if binding.device_type != DeviceType::None {
                info!(port = port_number(port), device = %plugged, "Registered device in port {}", port_number(port));
            }
        }
        info!("Done initializing registry");
    }

    /// Re-scan the probe and replace the cached plug snapshot
    ///
    /// Bindings are not touched.
    pub async fn refresh_plug_snapshot(&self) -> PlugSnapshot {
        let snapshot = self.scan().await;
        self.state.lock().snapshot = snapshot;
        snapshot
    }

    async fn scan(&self) -> PlugSnapshot {
        let codes = self.probe.snapshot_codes().await;
        PlugSnapshot::from_codes(&codes)
    }

    // =========================================================================
    // Bind / Unbind
    // =========================================================================

    /// Bind a device type to a port
    ///
    /// # Errors
    /// - `InvalidPort` if the index is out of range
    /// - `InvalidDeviceType` if `device_type` is `None` or `Undefined`
    /// - `PortConflict` if the port is already bound
    /// - `TypeMismatch` if a different device is plugged in
    ///
    /// An empty port may be bound in advance.
    pub fn bind(&self, port: usize, device_type: DeviceType) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        self.bind_locked(&mut state, port, device_type)
    }

    fn bind_locked(
        &self,
        state: &mut RegistryState,
        port: usize,
        device_type: DeviceType,
    ) -> Result<(), RegistryError> {
        let port = check_port(port).inspect_err(|_| {
            error!(port = port_number(port), "Registration: Invalid port number {}", port_number(port));
        })?;

        if !device_type.is_concrete() {
            error!(port = port_number(port), device = %device_type, "Registration: Cannot bind a {} device", device_type);
            return Err(RegistryError::InvalidDeviceType(device_type));
        }

        let current = state.table.get(port)?;
        if !current.is_unbound() {
            error!(port = port_number(port), bound = %current.device_type, "Registration: Port already in use {}", port_number(port));
            return Err(RegistryError::PortConflict {
                port,
                bound: current.device_type,
            });
        }

        let plugged = state.snapshot.get(port).unwrap_or(DeviceType::None);
        if plugged != device_type && plugged != DeviceType::None {
            error!(
                port = port_number(port),
                requested = %device_type,
                plugged = %plugged,
                "Registration: Device mismatch in port {}",
                port_number(port)
            );
            return Err(RegistryError::TypeMismatch {
                port,
                requested: device_type,
                plugged,
            });
        }

        info!(port = port_number(port), device = %device_type, "Registering device in port {}", port_number(port));
        state
            .table
            .set(port, PortBinding::new(device_type, self.probe.handle_at(port)))
    }

    /// Release a port's binding
    ///
    /// Unbinding an already-unbound port succeeds.
    pub fn unbind(&self, port: usize) -> Result<(), RegistryError> {
        let port = check_port(port)?;
        let mut state = self.state.lock();
        state.table.reset(port)?;
        state.last_fault[port] = None;
        if self.reset_policy == WarningResetPolicy::OnResolve {
            self.throttle.clear(port);
        }
        debug!(port = port_number(port), "Unbound port {}", port_number(port));
        Ok(())
    }

    /// Release a port's binding, addressed by its 1-based port number
    ///
    /// Compatibility entry point for callers that number ports as printed on
    /// the controller.
    pub fn unbind_port_number(&self, number: usize) -> Result<(), RegistryError> {
        self.unbind(index_from_port_number(number)?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Binding stored for a port
    pub fn get_binding(&self, port: usize) -> Result<PortBinding, RegistryError> {
        self.state.lock().table.get(port)
    }

    /// Device type bound to a port
    pub fn get_bound_type(&self, port: usize) -> Result<DeviceType, RegistryError> {
        Ok(self.get_binding(port)?.device_type)
    }

    /// Device type plugged into a port, as of the latest scan
    pub fn get_plug_type(&self, port: usize) -> Result<DeviceType, RegistryError> {
        let port = check_port(port)?;
        Ok(self.state.lock().snapshot.get(port).unwrap_or(DeviceType::None))
    }

    /// Hardware handle stored with a port's binding
    pub fn get_handle(&self, port: usize) -> Result<Option<DeviceHandle>, RegistryError> {
        Ok(self.get_binding(port)?.handle)
    }

    /// Copy of every binding
    pub fn bindings(&self) -> [PortBinding; NUM_PORTS] {
        self.state.lock().table.slots()
    }

    /// Latest cached plug snapshot
    pub fn plug_snapshot(&self) -> PlugSnapshot {
        self.state.lock().snapshot
    }

    /// Bound and plugged state of every port
    pub fn status_report(&self) -> Vec<PortStatus> {
        let state = self.state.lock();
        state
            .table
            .slots()
            .iter()
            .zip(state.snapshot.iter())
            .map(|(binding, (port, plugged))| PortStatus {
                port: port_number(port),
                bound: binding.device_type,
                plugged,
                handle: binding.handle.map(|h| h.raw()),
            })
            .collect()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Reconcile a port's binding with the plugged device and an expectation
    ///
    /// If the port is unbound and a recognized device is plugged in, that device
    /// is bound first (auto-bind). `expected == None` accepts any bound type.
    ///
    /// Warnings for `NothingPlugged` and `Mismatch` are emitted at most once per
    /// port until the throttle flag is released (see [`WarningResetPolicy`]).
    /// Under `OnResolve` a change from one fault to the other also releases it.
    pub fn validate(
        &self,
        port: usize,
        expected: DeviceType,
    ) -> Result<ValidationOutcome, RegistryError> {
        let port = check_port(port)?;
        let mut state = self.state.lock();

        let mut registered = state.table.get(port)?.device_type;
        let actual = state.snapshot.get(port).unwrap_or(DeviceType::None);

        if registered == DeviceType::None && actual.is_concrete() {
            debug!(port = port_number(port), device = %actual, "Auto-binding port {}", port_number(port));
            if self.bind_locked(&mut state, port, actual).is_ok() {
                registered = state.table.get(port)?.device_type;
            }
        }

        // Throttle updates stay under the lock so concurrent validations of one
        // port emit a single warning.
        let outcome = if (expected == registered || expected == DeviceType::None)
            && registered == actual
        {
            ValidationOutcome::Consistent
        } else if actual == DeviceType::None {
            ValidationOutcome::NothingPlugged
        } else {
            ValidationOutcome::Mismatch
        };

        let fault = (!outcome.is_consistent()).then_some(outcome);
        let previous = std::mem::replace(&mut state.last_fault[port], fault);
        if self.reset_policy == WarningResetPolicy::OnResolve
            && previous.is_some_and(|p| fault.is_some_and(|f| f != p))
        {
            self.throttle.clear(port);
        }

        match outcome {
            ValidationOutcome::Consistent => {
                if self.reset_policy == WarningResetPolicy::OnResolve && self.throttle.clear(port) {
                    info!(port = port_number(port), "Port {} recovered", port_number(port));
                }
            }
            ValidationOutcome::NothingPlugged => {
                if !self.throttle.has_warned(port) {
                    warn!(
                        port = port_number(port),
                        expected = %expected,
                        "No device in port {}. Is it plugged in?",
                        port_number(port)
                    );
                    self.throttle.mark_warned(port);
                }
            }
            ValidationOutcome::Mismatch => {
                if !self.throttle.has_warned(port) {
                    warn!(
                        port = port_number(port),
                        expected = %expected,
                        bound = %registered,
                        plugged = %actual,
                        "Device mismatch in port {}",
                        port_number(port)
                    );
                    self.throttle.mark_warned(port);
                }
            }
        }

        Ok(outcome)
    }
}

// =============================================================================
// Tests
// =============================================================================
