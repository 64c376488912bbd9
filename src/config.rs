//! Configuration System using Figment
//!
//! Strongly-typed configuration for the registry binary and the port monitor.
//! Configuration is loaded from:
//! 1. `config/port_registry.toml` (base configuration)
//! 2. Environment variables (prefixed with `PORT_REGISTRY_`, nested keys split on `__`)
//!
//! Port numbers in the file are 1-based, as printed on the controller.
//!
//! # Example
//! ```no_run
//! use port_registry::config::RegistryConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistryConfig::load()?;
//! config.validate()?;
//! println!("Application: {}", config.application.name);
//! # Ok(())
//! # }
//! ```
//!
//! ```toml
//! [application]
//! name = "Port Registry"
//! log_level = "info"
//! log_format = "compact"
//!
//! [registry]
//! warning_reset = "on_resolve"
//! poll_interval_ms = 20
//!
//! [simulation]
//! scan_latency_ms = 2
//! ports = [{ port = 1, device = "motor" }, { port = 6, device = "optical" }]
//!
//! [[expect]]
//! port = 1
//! device = "motor"
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::hardware::device_type::{index_from_port_number, DeviceType, NUM_PORTS};
use crate::hardware::throttle::WarningResetPolicy;
use crate::logging::OutputFormat;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/port_registry.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Registry behaviour
    #[serde(default)]
    pub registry: RegistrySettings,
    /// Simulated controller used when no hardware is attached
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Devices the robot program expects on each port
    #[serde(default)]
    pub expect: Vec<ExpectedDevice>,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log line format (pretty, compact, json)
    #[serde(default)]
    pub log_format: OutputFormat,
}

/// Registry behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// When latched port warnings are released
    #[serde(default)]
    pub warning_reset: WarningResetPolicy,
    /// Monitor poll period in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Simulated controller configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated bus latency per scan in milliseconds
    #[serde(default)]
    pub scan_latency_ms: u64,
    /// Devices reported as plugged in
    #[serde(default)]
    pub ports: Vec<SimulatedPort>,
}

/// A device the simulated controller reports on a port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedPort {
    /// 1-based port number
    pub port: usize,
    /// Plugged device type
    pub device: DeviceType,
}

/// A device the robot program expects on a port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedDevice {
    /// 1-based port number
    pub port: usize,
    /// Expected device type (`none` accepts whatever is bound)
    pub device: DeviceType,
}

// Default value functions
fn default_name() -> String {
    "Port Registry".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    20
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: OutputFormat::default(),
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            warning_reset: WarningResetPolicy::default(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from the default file and environment variables
    ///
    /// Environment variables override the file, e.g.
    /// `PORT_REGISTRY_APPLICATION__LOG_LEVEL=debug`.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path).extract()?)
    }

    fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(RegistryConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PORT_REGISTRY_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(AppError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.registry.poll_interval_ms == 0 {
            return Err(AppError::Configuration(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        let simulated = self.simulation.ports.iter().map(|p| (p.port, p.device));
        check_ports("simulation.ports", simulated)?;

        let expected = self.expect.iter().map(|e| (e.port, e.device));
        check_ports("expect", expected)?;

        Ok(())
    }

    /// Expected devices as `(port index, device type)` pairs
    pub fn expected_ports(&self) -> AppResult<Vec<(usize, DeviceType)>> {
        self.expect
            .iter()
            .map(|e| Ok((index_from_port_number(e.port)?, e.device)))
            .collect()
    }
}

fn check_ports<I>(section: &str, entries: I) -> AppResult<()>
where
    I: Iterator<Item = (usize, DeviceType)>,
{
    let mut seen = HashSet::new();
    for (port, device) in entries {
        if port == 0 || port > NUM_PORTS {
            return Err(AppError::Configuration(format!(
                "{section}: port {port} out of range 1-{NUM_PORTS}"
            )));
        }
        if device == DeviceType::Undefined {
            return Err(AppError::Configuration(format!(
                "{section}: port {port} cannot use device 'undefined'"
            )));
        }
        if !seen.insert(port) {
            return Err(AppError::Configuration(format!(
                "{section}: duplicate port {port}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            [application]
            name = "Test Bot"
            log_level = "debug"
            log_format = "json"

            [registry]
            warning_reset = "never"
            poll_interval_ms = 50

            [simulation]
            scan_latency_ms = 3
            ports = [{ port = 1, device = "motor" }, { port = 6, device = "optical" }]

            [[expect]]
            port = 6
            device = "optical"
            "#,
        );

        let config = RegistryConfig::load_from(file.path()).unwrap();
        assert_eq!(config.application.name, "Test Bot");
        assert_eq!(config.application.log_format, OutputFormat::Json);
        assert_eq!(config.registry.warning_reset, WarningResetPolicy::Never);
        assert_eq!(config.registry.poll_interval_ms, 50);
        assert_eq!(config.simulation.ports.len(), 2);
        assert_eq!(config.simulation.ports[1].device, DeviceType::Optical);
        assert!(config.validate().is_ok());
        assert_eq!(config.expected_ports().unwrap(), vec![(5, DeviceType::Optical)]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig::load_from(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.registry.warning_reset, WarningResetPolicy::OnResolve);
        assert!(config.expect.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_device_name_fails_to_load() {
        let file = write_config(
            r#"
            [[expect]]
            port = 2
            device = "flux_capacitor"
            "#,
        );

        assert!(matches!(
            RegistryConfig::load_from(file.path()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = RegistryConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_out_of_range() {
        let mut config = RegistryConfig::default();
        config.expect.push(ExpectedDevice {
            port: 0,
            device: DeviceType::Motor,
        });
        assert!(config.validate().is_err());

        config.expect[0].port = NUM_PORTS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_ports() {
        let mut config = RegistryConfig::default();
        for _ in 0..2 {
            config.simulation.ports.push(SimulatedPort {
                port: 4,
                device: DeviceType::Imu,
            });
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut config = RegistryConfig::default();
        config.registry.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
