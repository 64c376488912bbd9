//! End-to-end registry scenarios
//!
//! Walks the registry through the situations a robot program meets at startup
//! and while running: empty ports, devices plugged before first use, double
//! registration, wrong device on a port, and releasing unused ports.

use port_registry::config::RegistryConfig;
use port_registry::hardware::{DeviceType, MockProbe, PortRegistry, ValidationOutcome};
use port_registry::monitor::PortMonitor;
use port_registry::{RegistryError, RegistryErrorKind};
use std::io::Write;
use std::sync::Arc;

const SENSOR: DeviceType = DeviceType::Distance;

async fn started(probe: &Arc<MockProbe>) -> PortRegistry {
    let registry = PortRegistry::with_probe(probe.clone());
    registry.initialize().await;
    registry
}

#[tokio::test]
async fn test_empty_port_after_initialize() {
    let probe = Arc::new(MockProbe::new());
    let registry = started(&probe).await;

    assert_eq!(registry.get_bound_type(3).unwrap(), DeviceType::None);
    assert_eq!(
        registry.validate(3, DeviceType::None).unwrap(),
        ValidationOutcome::Consistent
    );
}

#[tokio::test]
async fn test_sensor_plugged_before_first_use_auto_binds() {
    let probe = Arc::new(MockProbe::new());
    let registry = PortRegistry::with_probe(probe.clone());
    probe.plug(5, SENSOR).unwrap();
    registry.refresh_plug_snapshot().await;
    assert_eq!(registry.get_bound_type(5).unwrap(), DeviceType::None);

    assert_eq!(
        registry.validate(5, SENSOR).unwrap(),
        ValidationOutcome::Consistent
    );
    assert_eq!(registry.get_bound_type(5).unwrap(), SENSOR);
}

#[tokio::test]
async fn test_second_bind_conflicts() {
    let probe = Arc::new(MockProbe::new());
    let registry = started(&probe).await;

    assert!(registry.bind(5, SENSOR).is_ok());
    assert_eq!(
        registry.bind(5, SENSOR).unwrap_err().kind(),
        RegistryErrorKind::PortConflict
    );
}

#[tokio::test]
async fn test_bind_against_different_device_is_rejected() {
    let probe = Arc::new(MockProbe::new());
    let registry = PortRegistry::with_probe(probe.clone());
    probe.plug(2, SENSOR).unwrap();
    registry.refresh_plug_snapshot().await;

    assert_eq!(
        registry.bind(2, DeviceType::Motor),
        Err(RegistryError::TypeMismatch {
            port: 2,
            requested: DeviceType::Motor,
            plugged: SENSOR,
        })
    );
    assert_eq!(registry.get_bound_type(2).unwrap(), DeviceType::None);
}

#[tokio::test]
async fn test_unbind_never_bound_port() {
    let probe = Arc::new(MockProbe::new());
    let registry = started(&probe).await;

    assert!(registry.unbind(6).is_ok());
    assert_eq!(registry.get_bound_type(6).unwrap(), DeviceType::None);
}

#[tokio::test]
async fn test_device_swapped_while_running() {
    let probe = Arc::new(MockProbe::with_devices([(0, DeviceType::Motor)]).unwrap());
    let registry = started(&probe).await;

    // Motor pulled and an IMU plugged into the same port
    probe.plug(0, DeviceType::Imu).unwrap();
    registry.refresh_plug_snapshot().await;
    assert_eq!(
        registry.validate(0, DeviceType::Motor).unwrap(),
        ValidationOutcome::Mismatch
    );

    // Program releases the port and re-validates for the new device
    registry.unbind(0).unwrap();
    assert_eq!(
        registry.validate(0, DeviceType::Imu).unwrap(),
        ValidationOutcome::Consistent
    );
    assert_eq!(registry.get_bound_type(0).unwrap(), DeviceType::Imu);
}

#[tokio::test]
async fn test_monitor_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [registry]
        poll_interval_ms = 5

        [simulation]
        ports = [{{ port = 1, device = "motor" }}, {{ port = 6, device = "optical" }}]

        [[expect]]
        port = 1
        device = "motor"

        [[expect]]
        port = 6
        device = "optical"

        [[expect]]
        port = 14
        device = "distance"
        "#
    )
    .unwrap();

    let config = RegistryConfig::load_from(file.path()).unwrap();
    config.validate().unwrap();

    let probe = Arc::new(MockProbe::from_config(&config.simulation).unwrap());
    let registry = Arc::new(started(&probe).await);
    let monitor = PortMonitor::from_config(registry.clone(), &config).unwrap();

    let report = monitor.poll_once().await.unwrap();
    assert_eq!(
        report.outcomes,
        vec![
            (0, ValidationOutcome::Consistent),
            (5, ValidationOutcome::Consistent),
            (13, ValidationOutcome::NothingPlugged),
        ]
    );

    probe.plug(13, DeviceType::Distance).unwrap();
    assert!(monitor.poll_once().await.unwrap().all_consistent());
    assert_eq!(registry.get_bound_type(13).unwrap(), DeviceType::Distance);
}
