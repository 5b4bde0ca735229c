//! # connectedcar2mqtt core
//!
//! The pure parts of the bridge: vehicle snapshot model, field-level change
//! detection, distance from home and the adaptive polling cadence.
//!
//! ## Key Concepts
//!
//! - **Snapshot**: one fully materialized read of the vehicle
//! - **`ChangeSet`**: ordered per-field differences between two snapshots
//! - **Cadence**: the delay before the next fetch, derived from ignition
//!   state and distance from home
//!
//! Nothing in this crate performs I/O. The fetcher and publisher are traits
//! implemented by the adapter crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cadence;
pub mod diff;
pub mod distance;
pub mod fetch;
pub mod publish;
pub mod snapshot;
pub mod topics;

pub use cadence::{next_delay, CadenceState};
pub use diff::{diff, Change, ChangeSet};
pub use distance::distance_km;
pub use fetch::{FetchError, SnapshotFetcher};
pub use publish::{PublishError, Publisher, QoS};
pub use snapshot::{
    seed_previous, Battery, Coordinate, FieldValue, FuelLevel, Ignition, Odometer, Position,
    VehicleSnapshot,
};
pub use topics::VehicleTopics;
