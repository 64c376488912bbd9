//! Error types for the port registry.
//!
//! Two layers of errors are defined here, both using the `thiserror` crate:
//!
//! - **`RegistryError`**: categorical, recoverable failures returned by the registry
//!   operations (`bind`, `unbind`, queries). None of them is fatal: a bad request
//!   degrades a single port and the caller decides what to do next.
//! - **`AppError`**: application-level failures (configuration loading, I/O) seen by
//!   the binary and the monitor. Registry errors convert into it with `?`.
//!
//! Validation outcomes (`NothingPlugged`, `Mismatch`) are *not* errors; they are
//! reported through `ValidationOutcome` in the registry module.

use crate::hardware::device_type::{port_number, DeviceType};
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Failure returned by a registry operation
///
/// Port values are the 0-based index the caller passed in; the `Display`
/// output presents them 1-based like every other human-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Out-of-range value, shown exactly as the caller passed it. It may be a
    /// 0-based index or a rejected 1-based number, so it is not converted.
    #[error("Invalid port index {port}")]
    InvalidPort { port: usize },

    #[error("Port {} already in use by a {bound} device", display_port(.port))]
    PortConflict { port: usize, bound: DeviceType },

    #[error("Device mismatch in port {}: requested {requested}, plugged {plugged}", display_port(.port))]
    TypeMismatch {
        port: usize,
        requested: DeviceType,
        plugged: DeviceType,
    },

    #[error("Device type '{0}' cannot be bound to a port")]
    InvalidDeviceType(DeviceType),
}

fn display_port(port: &usize) -> usize {
    port_number(*port)
}

/// Error category, for callers that only care about the kind of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryErrorKind {
    /// Index out of range
    InvalidPort,
    /// Port already bound
    PortConflict,
    /// Plugged device disagrees with the requested type
    TypeMismatch,
    /// Requested type is a sentinel
    InvalidDeviceType,
}

impl RegistryError {
    /// Categorical kind of this error
    pub fn kind(&self) -> RegistryErrorKind {
        match self {
            RegistryError::InvalidPort { .. } => RegistryErrorKind::InvalidPort,
            RegistryError::PortConflict { .. } => RegistryErrorKind::PortConflict,
            RegistryError::TypeMismatch { .. } => RegistryErrorKind::TypeMismatch,
            RegistryError::InvalidDeviceType(_) => RegistryErrorKind::InvalidDeviceType,
        }
    }
}

/// Application-level error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_one_based_port_numbers() {
        let err = RegistryError::PortConflict {
            port: 4,
            bound: DeviceType::Motor,
        };
        assert_eq!(err.to_string(), "Port 5 already in use by a motor device");

        let err = RegistryError::TypeMismatch {
            port: 1,
            requested: DeviceType::Imu,
            plugged: DeviceType::Optical,
        };
        assert_eq!(
            err.to_string(),
            "Device mismatch in port 2: requested imu, plugged optical"
        );
    }

    #[test]
    fn invalid_port_shows_value_as_passed() {
        assert_eq!(
            RegistryError::InvalidPort { port: 22 }.to_string(),
            "Invalid port index 22"
        );
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            RegistryError::InvalidPort { port: 99 }.kind(),
            RegistryErrorKind::InvalidPort
        );
        assert_eq!(
            RegistryError::InvalidDeviceType(DeviceType::None).kind(),
            RegistryErrorKind::InvalidDeviceType
        );
    }

    #[test]
    fn registry_error_converts_to_app_error() {
        fn fails() -> AppResult<()> {
            Err(RegistryError::InvalidPort { port: 30 })?;
            Ok(())
        }

        match fails() {
            Err(AppError::Registry(RegistryError::InvalidPort { port })) => assert_eq!(port, 30),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
