//! GraphQL query and response mapping.
//!
//! The API nests the vehicle under `data.viewer.vehicles[].vehicle`. Only the
//! first vehicle of the account is used.

use cc2mqtt_core::{
    Battery, FetchError, FuelLevel, Ignition, Odometer, Position, VehicleSnapshot,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Query for everything a snapshot carries.
pub const FULL_QUERY: &str = r"
query User {
    viewer {
        vehicles {
            vehicle {
                id
                licensePlate
                fuelEconomy
                odometer {
                    odometer
                    time
                }
                fuelLevel {
                    liter
                    time
                }
                position {
                    latitude
                    longitude
                    time
                }
                latestBatteryVoltage {
                    voltage
                    time
                }
                ignition {
                    on
                    time
                }
            }
        }
    }
}";

/// A number the API may send either as JSON number or as string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Number {
    Float(f64),
    Text(String),
}

impl Number {
    fn value(&self, field: &str) -> Result<f64, FetchError> {
        let value = match self {
            Self::Float(value) => *value,
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| FetchError::Parse(format!("{field}: not a number: {text:?}")))?,
        };
        // NaN never compares equal and would be republished on every poll
        if !value.is_finite() {
            return Err(FetchError::Parse(format!("{field}: not finite: {value}")));
        }
        Ok(value)
    }
}

fn number(value: Option<&Number>, field: &str) -> Result<Option<f64>, FetchError> {
    value.map(|n| n.value(field)).transpose()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVehicle {
    license_plate: Option<String>,
    fuel_economy: Option<Number>,
    odometer: Option<WireOdometer>,
    fuel_level: Option<WireFuelLevel>,
    position: Option<WirePosition>,
    latest_battery_voltage: Option<WireBattery>,
    ignition: Option<WireIgnition>,
}

#[derive(Debug, Deserialize)]
struct WireOdometer {
    odometer: Option<Number>,
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireFuelLevel {
    liter: Option<Number>,
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WirePosition {
    latitude: Option<Number>,
    longitude: Option<Number>,
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireBattery {
    voltage: Option<Number>,
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireIgnition {
    on: Option<bool>,
    time: Option<DateTime<Utc>>,
}

/// Map a GraphQL response body to a snapshot.
///
/// # Errors
///
/// Returns [`FetchError::Api`] if the body carries GraphQL errors,
/// [`FetchError::NoVehicle`] if the account has no vehicles and
/// [`FetchError::Parse`] if the body has an unexpected shape.
pub fn parse_response(body: &Value) -> Result<VehicleSnapshot, FetchError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(FetchError::Api {
                status: 200,
                message,
            });
        }
    }

    let vehicles = body
        .pointer("/data/viewer/vehicles")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Parse("missing data.viewer.vehicles".to_string()))?;

    let vehicle = vehicles
        .first()
        .ok_or(FetchError::NoVehicle)?
        .get("vehicle")
        .ok_or_else(|| FetchError::Parse("missing vehicle object".to_string()))?;

    let wire: WireVehicle =
        serde_json::from_value(vehicle.clone()).map_err(|e| FetchError::Parse(e.to_string()))?;

    wire.into_snapshot()
}

impl WireVehicle {
    fn into_snapshot(self) -> Result<VehicleSnapshot, FetchError> {
        let license_plate = self
            .license_plate
            .ok_or_else(|| FetchError::Parse("missing licensePlate".to_string()))?;

        let mut snapshot = VehicleSnapshot::new(license_plate);
        snapshot.fuel_economy = number(self.fuel_economy.as_ref(), "fuelEconomy")?;

        // Partial objects are treated as not reported
        if let Some(position) = self.position {
            let latitude = number(position.latitude.as_ref(), "position.latitude")?;
            let longitude = number(position.longitude.as_ref(), "position.longitude")?;
            if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
                snapshot.position = Some(Position {
                    latitude,
                    longitude,
                    time: position.time,
                });
            }
        }

        if let Some(fuel) = self.fuel_level {
            if let Some(liters) = number(fuel.liter.as_ref(), "fuelLevel.liter")? {
                snapshot.fuel_level = Some(FuelLevel {
                    liters,
                    time: fuel.time,
                });
            }
        }

        if let Some(odometer) = self.odometer {
            if let Some(distance) = number(odometer.odometer.as_ref(), "odometer.odometer")? {
                snapshot.odometer = Some(Odometer {
                    distance,
                    time: odometer.time,
                });
            }
        }

        if let Some(ignition) = self.ignition {
            snapshot.ignition = Ignition {
                on: ignition.on.unwrap_or(false),
                time: ignition.time,
            };
        }

        if let Some(battery) = self.latest_battery_voltage {
            snapshot.battery = Battery {
                voltage: number(battery.voltage.as_ref(), "latestBatteryVoltage.voltage")?
                    .unwrap_or_default(),
                time: battery.time,
            };
        }

        Ok(snapshot)
    }
}
