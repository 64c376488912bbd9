//! Per-port warning latch
//!
//! Polling an unplugged or mismatched port every few milliseconds would flood the
//! log with the same warning. The throttle keeps one flag per port: set once a
//! warning has been emitted for the port's current problem, consulted before
//! emitting another.
//!
//! When a flag is cleared is decided by [`WarningResetPolicy`].

use crate::hardware::device_type::NUM_PORTS;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Flag store consulted before emitting a port warning
pub trait WarningThrottle: Send + Sync {
    /// True if a warning is latched for the port
    fn has_warned(&self, port: usize) -> bool;

    /// Latch the warning flag for the port
    fn mark_warned(&self, port: usize);

    /// Release the warning flag, returning whether it was set
    fn clear(&self, port: usize) -> bool;
}

/// When a latched port warning is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningResetPolicy {
    /// Clear when the port validates as consistent again, is unbound, or
    /// moves from one fault to the other (nothing plugged / mismatch)
    #[default]
    OnResolve,
    /// Never clear: one warning per port for the life of the process, whatever
    /// the fault
    Never,
}

/// Default throttle: one atomic flag per port
#[derive(Debug)]
pub struct PortWarningFlags {
    flags: [AtomicBool; NUM_PORTS],
}

impl PortWarningFlags {
    /// All flags released
    pub fn new() -> Self {
        Self {
            flags: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }
}

impl Default for PortWarningFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningThrottle for PortWarningFlags {
    fn has_warned(&self, port: usize) -> bool {
        self.flags
            .get(port)
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    fn mark_warned(&self, port: usize) {
        if let Some(flag) = self.flags.get(port) {
            flag.store(true, Ordering::Release);
        }
    }

    fn clear(&self, port: usize) -> bool {
        self.flags
            .get(port)
            .is_some_and(|flag| flag.swap(false, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_and_clear() {
        let flags = PortWarningFlags::new();
        assert!(!flags.has_warned(4));

        flags.mark_warned(4);
        assert!(flags.has_warned(4));
        assert!(!flags.has_warned(5));

        assert!(flags.clear(4));
        assert!(!flags.has_warned(4));
        assert!(!flags.clear(4));
    }

    #[test]
    fn test_out_of_range_ports_are_ignored() {
        let flags = PortWarningFlags::new();
        flags.mark_warned(NUM_PORTS);
        assert!(!flags.has_warned(NUM_PORTS));
        assert!(!flags.clear(NUM_PORTS));
    }

    #[test]
    fn test_policy_spelling() {
        let policy: WarningResetPolicy = serde_json::from_str("\"never\"").unwrap();
        assert_eq!(policy, WarningResetPolicy::Never);
        assert_eq!(WarningResetPolicy::default(), WarningResetPolicy::OnResolve);
    }
}
