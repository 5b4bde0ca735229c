//! Vehicle-relative MQTT topic scheme.
//!
//! Topic structure: `{license_plate}/{field_path_with_underscores}`
//!
//! Examples:
//! - `AB12345/ignition_on`
//! - `AB12345/position_latitude`
//! - `AB12345/distance`
//!
//! The broker-wide root (e.g. `connectedcar/`) is added by the publisher.

/// Topic suffix for the derived distance-from-home metric.
pub const DISTANCE: &str = "distance";

/// Topic builder for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleTopics {
    /// License plate used as the namespace
    pub license_plate: String,
}

impl VehicleTopics {
    /// Create a topic builder for the given vehicle.
    #[must_use]
    pub fn new(license_plate: impl Into<String>) -> Self {
        Self {
            license_plate: license_plate.into(),
        }
    }

    /// Topic for a changed field.
    #[must_use]
    pub fn field(&self, path: &str) -> String {
        format!("{}/{}", self.license_plate, path.replace('.', "_"))
    }

    /// Topic for the distance from home.
    #[must_use]
    pub fn distance(&self) -> String {
        format!("{}/{DISTANCE}", self.license_plate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_generation() {
        let topics = VehicleTopics::new("AB12345");

        assert_eq!(topics.field("ignition.on"), "AB12345/ignition_on");
        assert_eq!(topics.field("fuelEconomy"), "AB12345/fuelEconomy");
        assert_eq!(topics.distance(), "AB12345/distance");
    }

    #[test]
    fn every_path_segment_is_flattened() {
        let topics = VehicleTopics::new("AB12345");

        assert_eq!(topics.field("fuelLevel.liter"), "AB12345/fuelLevel_liter");
        assert_eq!(topics.field("odometer.odometer"), "AB12345/odometer_odometer");
    }
}
