//! # Port Registry Core Library
//!
//! A robot controller exposes a fixed set of smart ports. Motors and sensors are
//! plugged into them at runtime, and software needs to know, at any moment, which
//! device category is expected on each port and whether the connected hardware
//! agrees. This crate provides that bookkeeping.
//!
//! ## Crate Structure
//!
//! - **`hardware`**: The core. `DeviceType` (closed device catalogue and hardware
//!   code conversion), the `HardwareProbe` boundary and its `MockProbe`
//!   simulation, the `PortTable` of bindings, the per-port `WarningThrottle`, and
//!   the `PortRegistry` service (initialize, bind, unbind, queries, validate).
//! - **`monitor`**: `PortMonitor`, a polling loop that refreshes the plug snapshot
//!   and validates every expected port.
//! - **`config`**: Figment-based configuration (TOML file + environment).
//! - **`logging`**: `tracing-subscriber` setup.
//! - **`error`**: `RegistryError` for registry operations and `AppError` for the
//!   application layer.

pub mod config;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod monitor;

pub use error::{AppError, AppResult, RegistryError, RegistryErrorKind};
pub use hardware::{DeviceType, PortRegistry, ValidationOutcome, NUM_PORTS};
