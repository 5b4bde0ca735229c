//! # MQTT Publisher
//!
//! Publishes vehicle changes to an MQTT broker.
//!
//! ## Topics
//!
//! Every topic handed to the publisher is relative. The configured root is
//! prepended, so `AB12345/ignition_on` with root `connectedcar` goes out as
//! `connectedcar/AB12345/ignition_on`.
//!
//! ## Connection handling
//!
//! The initial connection must succeed. After that, the rumqttc event loop
//! reconnects in the background and messages published while disconnected
//! are dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod publisher;

pub use publisher::{
    parse_broker, MqttPublisher, MqttPublisherConfig, PublisherError, RootTopic, DEFAULT_PORT,
};
