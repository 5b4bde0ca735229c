//! # connectedcar2mqtt agent
//!
//! Bridges the Connected Cars API to MQTT.
//!
//! ## Loop
//!
//! Each iteration:
//! 1. **Fetch** the current vehicle snapshot
//! 2. **Diff** it against the previous one and publish every changed field
//!    as a retained message under `{root}/{license_plate}/...`
//! 3. **Distance**: while the ignition is on, publish the distance from home
//! 4. **Sleep** for a delay chosen from ignition state and distance

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod runtime;

pub use config::{AgentConfig, Args};
pub use runtime::{IterationReport, PollLoop};
