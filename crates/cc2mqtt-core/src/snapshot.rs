//! Point-in-time vehicle state.
//!
//! A [`VehicleSnapshot`] is what one fetch returns. Nested readings that the
//! upstream API may omit are `Option`s, so "not reported" never collapses
//! into a zero value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Battery voltage written into the startup baseline.
pub const SEED_BATTERY_VOLTAGE: f64 = 1.1;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Last reported GPS position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// When the position was recorded
    pub time: Option<DateTime<Utc>>,
}

impl Position {
    /// The position as a bare coordinate.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Fuel tank reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLevel {
    /// Liters in the tank
    pub liters: f64,
    /// When the level was recorded
    pub time: Option<DateTime<Utc>>,
}

/// Odometer reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Odometer {
    /// Total distance driven, in kilometers
    pub distance: f64,
    /// When the odometer was read
    pub time: Option<DateTime<Utc>>,
}

/// Ignition state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ignition {
    /// Whether the ignition is on
    pub on: bool,
    /// When the state was recorded
    pub time: Option<DateTime<Utc>>,
}

/// Latest 12V battery measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    /// Voltage
    pub voltage: f64,
    /// When the voltage was measured
    pub time: Option<DateTime<Utc>>,
}

/// One fully materialized read of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    /// License plate, used as the per-vehicle topic namespace
    pub license_plate: String,
    /// Average fuel economy
    pub fuel_economy: Option<f64>,
    /// Last known position
    pub position: Option<Position>,
    /// Fuel level
    pub fuel_level: Option<FuelLevel>,
    /// Odometer
    pub odometer: Option<Odometer>,
    /// Ignition state
    pub ignition: Ignition,
    /// Battery voltage
    pub battery: Battery,
}

impl VehicleSnapshot {
    /// Create a snapshot with only the license plate set.
    #[must_use]
    pub fn new(license_plate: impl Into<String>) -> Self {
        Self {
            license_plate: license_plate.into(),
            fuel_economy: None,
            position: None,
            fuel_level: None,
            odometer: None,
            ignition: Ignition::default(),
            battery: Battery::default(),
        }
    }

    /// Flatten the snapshot into its leaf fields.
    ///
    /// Paths use the upstream API field names and come out in declaration
    /// order. The set of paths is the same for every snapshot: a missing
    /// object contributes [`FieldValue::Absent`] for each of its leaves.
    #[must_use]
    pub fn leaves(&self) -> Vec<(&'static str, FieldValue)> {
        let position = self.position.as_ref();
        let fuel_level = self.fuel_level.as_ref();
        let odometer = self.odometer.as_ref();

        vec![
            ("licensePlate", FieldValue::Text(self.license_plate.clone())),
            ("fuelEconomy", FieldValue::float(self.fuel_economy)),
            ("position.latitude", FieldValue::float(position.map(|p| p.latitude))),
            ("position.longitude", FieldValue::float(position.map(|p| p.longitude))),
            ("position.time", FieldValue::timestamp(position.and_then(|p| p.time))),
            ("fuelLevel.liter", FieldValue::float(fuel_level.map(|f| f.liters))),
            ("fuelLevel.time", FieldValue::timestamp(fuel_level.and_then(|f| f.time))),
            ("odometer.odometer", FieldValue::float(odometer.map(|o| o.distance))),
            ("odometer.time", FieldValue::timestamp(odometer.and_then(|o| o.time))),
            ("ignition.on", FieldValue::Bool(self.ignition.on)),
            ("ignition.time", FieldValue::timestamp(self.ignition.time)),
            ("battery.voltage", FieldValue::Float(self.battery.voltage)),
            ("battery.time", FieldValue::timestamp(self.battery.time)),
        ]
    }
}

/// Build the baseline the first fetched snapshot is compared against.
///
/// The baseline is a copy of `first` with the battery voltage replaced by
/// [`SEED_BATTERY_VOLTAGE`], so the first diff always reports at least the
/// battery voltage and every retained topic gets refreshed on startup.
#[must_use]
pub fn seed_previous(first: &VehicleSnapshot) -> VehicleSnapshot {
    let mut seed = first.clone();
    seed.battery.voltage = SEED_BATTERY_VOLTAGE;
    seed
}

/// The value of one leaf field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A string
    Text(String),
    /// A floating point number
    Float(f64),
    /// A boolean flag
    Bool(bool),
    /// A point in time
    Timestamp(DateTime<Utc>),
    /// Not reported by the API
    Absent,
}

impl FieldValue {
    fn float(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Float)
    }

    fn timestamp(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Absent, Self::Timestamp)
    }

    /// Render the value as an MQTT payload.
    ///
    /// `Absent` renders as the empty payload, which clears a retained topic.
    #[must_use]
    pub fn to_payload(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Timestamp(time) => f.write_str(&time.to_rfc3339()),
            Self::Absent => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn leaves_are_stable_for_sparse_snapshot() {
        let sparse = VehicleSnapshot::new("AB12345");
        let mut full = sparse.clone();
        full.position = Some(Position {
            latitude: 56.1,
            longitude: 9.2,
            time: None,
        });

        let sparse_paths: Vec<_> = sparse.leaves().into_iter().map(|(p, _)| p).collect();
        let full_paths: Vec<_> = full.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(sparse_paths, full_paths);
        assert_eq!(sparse_paths[0], "licensePlate");
    }

    #[test]
    fn absent_is_not_zero() {
        let mut snapshot = VehicleSnapshot::new("AB12345");
        snapshot.fuel_economy = Some(0.0);
        let leaves = snapshot.leaves();
        assert_eq!(leaves[1].1, FieldValue::Float(0.0));
        assert_eq!(leaves[2].1, FieldValue::Absent);
    }

    #[test]
    fn seed_only_touches_battery_voltage() {
        let mut first = VehicleSnapshot::new("AB12345");
        first.battery.voltage = 12.6;
        let seed = seed_previous(&first);

        assert!((seed.battery.voltage - SEED_BATTERY_VOLTAGE).abs() < f64::EPSILON);
        assert!((first.battery.voltage - 12.6).abs() < f64::EPSILON);
        assert_eq!(seed.license_plate, first.license_plate);
        assert_eq!(seed.ignition, first.ignition);
    }

    #[test]
    fn payload_rendering() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(FieldValue::Float(12.5).to_payload(), "12.5");
        assert_eq!(FieldValue::Bool(true).to_payload(), "true");
        assert_eq!(FieldValue::Text("AB12345".into()).to_payload(), "AB12345");
        assert_eq!(
            FieldValue::Timestamp(time).to_payload(),
            "2024-05-01T12:00:00+00:00"
        );
        assert_eq!(FieldValue::Absent.to_payload(), "");
    }
}
