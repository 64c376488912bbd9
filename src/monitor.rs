//! Periodic port monitoring
//!
//! The monitor is the polling loop a robot program runs alongside its control
//! tasks: on every tick it refreshes the plug snapshot and validates each port
//! the program expects to use. The registry's warning throttle keeps repeated
//! polling of an unplugged or mismatched port from flooding the log.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{AppError, AppResult};
use crate::hardware::device_type::{port_number, DeviceType};
use crate::hardware::registry::{PortRegistry, ValidationOutcome};

/// Outcome of one poll over every expected port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// `(port index, outcome)` in the order the ports were configured
    pub outcomes: Vec<(usize, ValidationOutcome)>,
}

impl PollReport {
    /// True if every expected port validated as consistent
    pub fn all_consistent(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_consistent())
    }

    /// Ports that did not validate as consistent
    pub fn faulty(&self) -> impl Iterator<Item = &(usize, ValidationOutcome)> {
        self.outcomes.iter().filter(|(_, outcome)| !outcome.is_consistent())
    }
}

/// Polling loop over a set of expected port devices
pub struct PortMonitor {
    registry: Arc<PortRegistry>,
    expected: Vec<(usize, DeviceType)>,
    interval: Duration,
}

impl PortMonitor {
    /// Create a monitor
    ///
    /// # Arguments
    /// * `registry` - Shared registry
    /// * `expected` - `(port index, expected device)` pairs
    /// * `interval` - Poll period
    ///
    /// # Errors
    /// `Configuration` if `interval` is zero.
    pub fn new(
        registry: Arc<PortRegistry>,
        expected: Vec<(usize, DeviceType)>,
        interval: Duration,
    ) -> AppResult<Self> {
        if interval.is_zero() {
            return Err(AppError::Configuration(
                "poll interval must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            registry,
            expected,
            interval,
        })
    }

    /// Create a monitor from the `[registry]` and `[[expect]]` configuration
    pub fn from_config(registry: Arc<PortRegistry>, config: &RegistryConfig) -> AppResult<Self> {
        Self::new(
            registry,
            config.expected_ports()?,
            Duration::from_millis(config.registry.poll_interval_ms),
        )
    }

    /// Refresh the plug snapshot and validate every expected port once
    pub async fn poll_once(&self) -> AppResult<PollReport> {
        self.registry.refresh_plug_snapshot().await;

        let mut report = PollReport::default();
        for &(port, expected) in &self.expected {
            let outcome = self.registry.validate(port, expected)?;
            debug!(port = port_number(port), outcome = outcome.as_str(), "Validated port {}", port_number(port));
            report.outcomes.push((port, outcome));
        }
        Ok(report)
    }

    /// Poll until the shutdown signal changes to `true` or its sender is dropped
    ///
    /// Returns the number of completed polls.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> AppResult<u64> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut polls = 0u64;

        info!(ports = self.expected.len(), interval_ms = self.interval.as_millis() as u64, "Port monitor started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await?;
                    polls += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(polls, "Port monitor stopped");
        Ok(polls)
    }
}
