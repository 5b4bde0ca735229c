//! Field-level change detection between two snapshots.

use crate::snapshot::{FieldValue, VehicleSnapshot};

/// One changed leaf field.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Dotted path of the field, e.g. `ignition.on`
    pub path: &'static str,
    /// Value in the newer snapshot
    pub value: FieldValue,
}

impl Change {
    /// Whether any segment of the path names a timestamp.
    #[must_use]
    pub fn is_timestamp(&self) -> bool {
        self.path.split('.').any(is_timestamp_segment)
    }
}

/// Ordered list of changes between two snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Changes in field declaration order
    pub changes: Vec<Change>,
}

impl ChangeSet {
    /// Create an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterate over the changes.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Look up the change for a path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.changes
            .iter()
            .find(|change| change.path == path)
            .map(|change| &change.value)
    }

    /// Drop changes to timestamp fields.
    ///
    /// Timestamps move on every read even when nothing of interest happened,
    /// so they are never published.
    #[must_use]
    pub fn without_timestamps(self) -> Self {
        Self {
            changes: self
                .changes
                .into_iter()
                .filter(|change| !change.is_timestamp())
                .collect(),
        }
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// A path segment names a timestamp if it is `time` or ends in `Time`.
fn is_timestamp_segment(segment: &str) -> bool {
    segment == "time" || segment.ends_with("Time")
}

/// Compare two snapshots and report every leaf that differs.
///
/// Values are taken from `current`. A leaf present on one side and absent on
/// the other is a change. Floats compare with `==`; no tolerance is applied.
#[must_use]
pub fn diff(previous: &VehicleSnapshot, current: &VehicleSnapshot) -> ChangeSet {
    let mut set = ChangeSet::new();

    for ((path, old), (_, new)) in previous.leaves().into_iter().zip(current.leaves()) {
        if old != new {
            tracing::trace!(path, old = %old, new = %new, "Field changed");
            set.changes.push(Change { path, value: new });
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{seed_previous, FuelLevel, Position, SEED_BATTERY_VOLTAGE};
    use chrono::{TimeZone, Utc};

    fn snapshot() -> VehicleSnapshot {
        let mut snapshot = VehicleSnapshot::new("AB12345");
        snapshot.fuel_economy = Some(18.2);
        snapshot.position = Some(Position {
            latitude: 56.0,
            longitude: 9.0,
            time: None,
        });
        snapshot.battery.voltage = 12.6;
        snapshot
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let a = snapshot();
        assert!(diff(&a, &a).is_empty());
        assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn reports_new_values() {
        let a = snapshot();
        let mut b = a.clone();
        b.ignition.on = true;
        b.battery.voltage = 13.9;

        let changes = diff(&a, &b);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.changes[0].path, "ignition.on");
        assert_eq!(changes.changes[0].value, FieldValue::Bool(true));
        assert_eq!(changes.get("battery.voltage"), Some(&FieldValue::Float(13.9)));

        let back = diff(&b, &a);
        assert_eq!(back.get("ignition.on"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn follows_declaration_order() {
        let a = snapshot();
        let mut b = a.clone();
        b.battery.voltage = 12.1;
        b.fuel_economy = Some(19.0);
        b.position = Some(Position {
            latitude: 56.5,
            longitude: 9.5,
            time: None,
        });

        let paths: Vec<_> = diff(&a, &b).iter().map(|c| c.path).collect();
        assert_eq!(
            paths,
            [
                "fuelEconomy",
                "position.latitude",
                "position.longitude",
                "battery.voltage"
            ]
        );
    }

    #[test]
    fn presence_change_is_reported() {
        let a = snapshot();
        let mut b = a.clone();
        b.fuel_level = Some(FuelLevel {
            liters: 31.0,
            time: None,
        });
        assert_eq!(diff(&a, &b).get("fuelLevel.liter"), Some(&FieldValue::Float(31.0)));

        let mut c = a.clone();
        c.position = None;
        let gone = diff(&a, &c);
        assert_eq!(gone.get("position.latitude"), Some(&FieldValue::Absent));
        assert_eq!(gone.get("position.longitude"), Some(&FieldValue::Absent));
    }

    #[test]
    fn no_float_tolerance() {
        let a = snapshot();
        let mut b = a.clone();
        b.battery.voltage += 1e-9;
        assert_eq!(diff(&a, &b).len(), 1);
    }

    #[test]
    fn timestamp_only_changes_are_filtered() {
        let a = snapshot();
        let mut b = a.clone();
        b.ignition.time = Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap());
        b.battery.time = Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 31, 0).unwrap());

        let changes = diff(&a, &b);
        assert_eq!(changes.len(), 2);
        assert!(changes.without_timestamps().is_empty());
    }

    #[test]
    fn timestamp_segments() {
        assert!(is_timestamp_segment("time"));
        assert!(is_timestamp_segment("lastUpdatedTime"));
        assert!(!is_timestamp_segment("odometer"));
        assert!(!is_timestamp_segment("timezone"));
    }

    #[test]
    fn seed_forces_battery_change() {
        let first = snapshot();
        let seed = seed_previous(&first);
        let changes = diff(&seed, &first);

        assert!(!changes.is_empty());
        assert_eq!(changes.get("battery.voltage"), Some(&FieldValue::Float(12.6)));
        assert!(seed.battery.voltage.eq(&SEED_BATTERY_VOLTAGE));
    }
}
