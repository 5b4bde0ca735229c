//! Message sink abstraction.

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QoS {
    /// Fire and forget
    #[default]
    AtMostOnce,
    /// Acknowledged delivery
    AtLeastOnce,
    /// Assured single delivery
    ExactlyOnce,
}

/// Anything that can publish a single message.
///
/// Publishing is fire-and-forget: implementations do not wait for broker
/// acknowledgement. While disconnected they drop the message and return
/// `Ok(())`; topic prefixing and reconnects are theirs to handle.
pub trait Publisher: Send + Sync {
    /// Publish `payload` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the message could not be handed to the
    /// transport while connected.
    fn publish(&self, topic: &str, payload: &str, qos: QoS, retain: bool)
        -> Result<(), PublishError>;
}

impl<P: Publisher + ?Sized> Publisher for std::sync::Arc<P> {
    fn publish(
        &self,
        topic: &str,
        payload: &str,
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishError> {
        (**self).publish(topic, payload, qos, retain)
    }
}

/// Errors that can occur while publishing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    /// The transport refused the message
    #[error("publish rejected: {0}")]
    Rejected(String),
}
