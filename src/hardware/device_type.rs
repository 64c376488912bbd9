//! Device categories reported by the controller's smart ports
//!
//! The controller reports a single byte per port describing what is physically
//! attached. [`DeviceType`] is the closed set of categories the registry
//! understands, plus two sentinels:
//!
//! - [`DeviceType::None`]: nothing expected / nothing present
//! - [`DeviceType::Undefined`]: an unrecognized hardware code, never a valid binding
//!
//! # Hardware Codes
//!
//! | Code | Category |
//! |------|----------|
//! | 0 | None |
//! | 2 | Motor |
//! | 4 | Rotation sensor |
//! | 6 | Inertial sensor |
//! | 7 | Distance sensor |
//! | 8 | Radio |
//! | 11 | Vision sensor |
//! | 12 | ADI expander |
//! | 16 | Optical sensor |
//! | 20 | GPS sensor |
//! | 129 | Generic serial |
//! | 255 | Undefined |

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of smart ports on the controller (21 external + internal radio slot)
pub const NUM_PORTS: usize = 22;

/// Category of device bound to, or plugged into, a smart port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// No device
    #[default]
    None,
    /// Smart motor
    Motor,
    /// Rotation sensor
    Rotation,
    /// Inertial measurement unit
    Imu,
    /// Distance sensor
    Distance,
    /// Radio
    Radio,
    /// Vision sensor
    Vision,
    /// Three-wire (ADI) expander
    Adi,
    /// Optical sensor
    Optical,
    /// GPS sensor
    Gps,
    /// Generic serial device
    Serial,
    /// Unrecognized hardware code
    Undefined,
}

impl DeviceType {
    /// Every concrete (bindable) category
    pub const CONCRETE: [DeviceType; 10] = [
        DeviceType::Motor,
        DeviceType::Rotation,
        DeviceType::Imu,
        DeviceType::Distance,
        DeviceType::Radio,
        DeviceType::Vision,
        DeviceType::Adi,
        DeviceType::Optical,
        DeviceType::Gps,
        DeviceType::Serial,
    ];

    /// Convert a raw hardware code into a device type
    ///
    /// Unknown codes map to [`DeviceType::Undefined`] instead of being cast.
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => DeviceType::None,
            2 => DeviceType::Motor,
            4 => DeviceType::Rotation,
            6 => DeviceType::Imu,
            7 => DeviceType::Distance,
            8 => DeviceType::Radio,
            11 => DeviceType::Vision,
            12 => DeviceType::Adi,
            16 => DeviceType::Optical,
            20 => DeviceType::Gps,
            129 => DeviceType::Serial,
            _ => DeviceType::Undefined,
        }
    }

    /// Raw hardware code for this device type
    pub const fn code(&self) -> u8 {
        match self {
            DeviceType::None => 0,
            DeviceType::Motor => 2,
            DeviceType::Rotation => 4,
            DeviceType::Imu => 6,
            DeviceType::Distance => 7,
            DeviceType::Radio => 8,
            DeviceType::Vision => 11,
            DeviceType::Adi => 12,
            DeviceType::Optical => 16,
            DeviceType::Gps => 20,
            DeviceType::Serial => 129,
            DeviceType::Undefined => 255,
        }
    }

    /// True for every category that may be stored as a binding
    pub const fn is_concrete(&self) -> bool {
        !matches!(self, DeviceType::None | DeviceType::Undefined)
    }

    /// Human-readable name (also the configuration spelling)
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceType::None => "none",
            DeviceType::Motor => "motor",
            DeviceType::Rotation => "rotation",
            DeviceType::Imu => "imu",
            DeviceType::Distance => "distance",
            DeviceType::Radio => "radio",
            DeviceType::Vision => "vision",
            DeviceType::Adi => "adi",
            DeviceType::Optical => "optical",
            DeviceType::Gps => "gps",
            DeviceType::Serial => "serial",
            DeviceType::Undefined => "undefined",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing (1-based) port number for a 0-based index
pub const fn port_number(index: usize) -> usize {
    index.saturating_add(1)
}

/// Convert a 1-based port number into a 0-based index
pub fn index_from_port_number(number: usize) -> Result<usize, RegistryError> {
    if number == 0 || number > NUM_PORTS {
        return Err(RegistryError::InvalidPort { port: number });
    }
    Ok(number - 1)
}

/// Check that a 0-based index lies in `[0, NUM_PORTS)`
pub fn check_port(port: usize) -> Result<usize, RegistryError> {
    if port < NUM_PORTS {
        Ok(port)
    } else {
        Err(RegistryError::InvalidPort { port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_variants() {
        assert_eq!(DeviceType::from_code(0), DeviceType::None);
        assert_eq!(DeviceType::from_code(2), DeviceType::Motor);
        assert_eq!(DeviceType::from_code(6), DeviceType::Imu);
        assert_eq!(DeviceType::from_code(129), DeviceType::Serial);
        assert_eq!(DeviceType::from_code(255), DeviceType::Undefined);

        for ty in DeviceType::CONCRETE {
            assert_eq!(DeviceType::from_code(ty.code()), ty);
        }
    }

    #[test]
    fn test_unknown_codes_are_undefined() {
        let known: Vec<u8> = DeviceType::CONCRETE
            .iter()
            .map(DeviceType::code)
            .chain([0, 255])
            .collect();

        for code in 0..=u8::MAX {
            if !known.contains(&code) {
                assert_eq!(DeviceType::from_code(code), DeviceType::Undefined, "code {code}");
            }
        }
    }

    #[test]
    fn test_concrete() {
        assert!(!DeviceType::None.is_concrete());
        assert!(!DeviceType::Undefined.is_concrete());
        assert!(DeviceType::Motor.is_concrete());
        assert!(DeviceType::CONCRETE.iter().all(DeviceType::is_concrete));
    }

    #[test]
    fn test_port_numbers() {
        assert_eq!(port_number(0), 1);
        assert_eq!(index_from_port_number(1), Ok(0));
        assert_eq!(index_from_port_number(NUM_PORTS), Ok(NUM_PORTS - 1));
        assert!(index_from_port_number(0).is_err());
        assert!(index_from_port_number(NUM_PORTS + 1).is_err());
        assert!(check_port(NUM_PORTS).is_err());
    }

    #[test]
    fn test_serde_spelling() {
        let ty: DeviceType = serde_json::from_str("\"optical\"").unwrap();
        assert_eq!(ty, DeviceType::Optical);
        assert_eq!(serde_json::to_string(&DeviceType::Imu).unwrap(), "\"imu\"");
    }
}
