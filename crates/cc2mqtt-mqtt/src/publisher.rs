//! MQTT publisher with root-topic prefixing and background reconnects.

use cc2mqtt_core::{PublishError, Publisher, QoS};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Default MQTT port.
pub const DEFAULT_PORT: u16 = 1883;

/// Pause between reconnect attempts after an event-loop error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Configuration for the MQTT publisher.
#[derive(Debug, Clone)]
pub struct MqttPublisherConfig {
    /// Broker host name or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client ID for MQTT connection
    pub client_id: String,
    /// Root topic prepended to every published topic
    pub root: String,
    /// Username, if the broker requires authentication
    pub username: Option<String>,
    /// Password, if the broker requires authentication
    pub password: Option<String>,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// How long to wait for the initial connection
    pub connect_timeout: Duration,
}

impl Default for MqttPublisherConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            client_id: "cc2mqtt".to_string(),
            root: "connectedcar".to_string(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Root topic prefix.
///
/// A non-empty root always ends in exactly one `/` so callers can pass
/// relative topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootTopic(String);

impl RootTopic {
    /// Normalize a root topic.
    #[must_use]
    pub fn new(root: &str) -> Self {
        if root.is_empty() || root.ends_with('/') {
            Self(root.to_string())
        } else {
            Self(format!("{root}/"))
        }
    }

    /// Prefix a relative topic with the root.
    #[must_use]
    pub fn prefixed(&self, topic: &str) -> String {
        format!("{}{topic}", self.0)
    }

    /// The normalized root.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fire-and-forget MQTT publisher.
///
/// The rumqttc event loop runs on a background task that keeps the
/// connection alive and reconnects after errors. Messages published while
/// the connection is down are dropped.
pub struct MqttPublisher {
    client: AsyncClient,
    root: RootTopic,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl MqttPublisher {
    /// Connect to the broker and start the background event loop.
    ///
    /// Waits up to `connect_timeout` for the broker to accept the
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::ConnectionSetup`] if the broker cannot be
    /// reached or refuses the connection.
    pub async fn connect(config: MqttPublisherConfig) -> Result<Self, PublisherError> {
        let mut mqtt_options = MqttOptions::new(&config.client_id, &config.host, config.port);
        mqtt_options.set_keep_alive(config.keep_alive);
        if let Some(username) = &config.username {
            mqtt_options.set_credentials(username, config.password.clone().unwrap_or_default());
        }

        let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

        tracing::info!(host = %config.host, port = config.port, "Connecting to MQTT broker");

        tokio::time::timeout(config.connect_timeout, wait_for_connack(&mut eventloop))
            .await
            .map_err(|_| {
                PublisherError::ConnectionSetup(format!(
                    "{}:{}: no answer within {:?}",
                    config.host, config.port, config.connect_timeout
                ))
            })??;

        tracing::info!("Connected to MQTT broker");

        let connected = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(drive(eventloop, Arc::clone(&connected)));

        Ok(Self {
            client,
            root: RootTopic::new(&config.root),
            connected,
            task,
        })
    }

    /// Whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Publisher for MqttPublisher {
    fn publish(
        &self,
        topic: &str,
        payload: &str,
        qos: QoS,
        retain: bool,
    ) -> Result<(), PublishError> {
        let topic = self.root.prefixed(topic);

        if !self.is_connected() {
            tracing::debug!(topic, "Not connected, dropping message");
            return Ok(());
        }

        tracing::debug!(topic, payload, retain, "Publishing");

        self.client
            .try_publish(topic, mqtt_qos(qos), retain, payload.as_bytes().to_vec())
            .map_err(|e| PublishError::Rejected(e.to_string()))
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll until the broker acknowledges the connection.
async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), PublisherError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    return Ok(());
                }
                return Err(PublisherError::ConnectionSetup(format!(
                    "broker refused connection: {:?}",
                    ack.code
                )));
            }
            Ok(_) => {}
            Err(e) => return Err(PublisherError::ConnectionSetup(e.to_string())),
        }
    }
}

/// Keep the event loop running for the lifetime of the publisher.
async fn drive(mut eventloop: EventLoop, connected: Arc<AtomicBool>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if !connected.swap(true, Ordering::SeqCst) {
                    tracing::info!("Reconnected to MQTT broker");
                }
            }
            Ok(_) => {}
            Err(e) => {
                if connected.swap(false, Ordering::SeqCst) {
                    tracing::warn!(error = %e, "Disconnected from MQTT broker, reconnecting");
                } else {
                    tracing::debug!(error = %e, "Reconnect attempt failed");
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

fn mqtt_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

/// Split a broker address into host and port.
///
/// Accepts `tcp://host[:port]`, `mqtt://host[:port]`, `host:port` or a bare
/// host, in which case `default_port` is used.
///
/// # Errors
///
/// Returns [`PublisherError::InvalidUrl`] for unsupported schemes, a missing
/// host or an unparsable port.
pub fn parse_broker(input: &str, default_port: u16) -> Result<(String, u16), PublisherError> {
    if input.contains("://") {
        let url =
            Url::parse(input).map_err(|e| PublisherError::InvalidUrl(format!("{input}: {e}")))?;

        match url.scheme() {
            "tcp" | "mqtt" => {}
            scheme => {
                return Err(PublisherError::InvalidUrl(format!(
                    "{input}: unsupported scheme '{scheme}'"
                )));
            }
        }

        let host = url
            .host_str()
            .ok_or_else(|| PublisherError::InvalidUrl(format!("{input}: missing host")))?;
        let port = url.port().unwrap_or(default_port);

        return Ok((host.to_string(), port));
    }

    let mut parts = input.split(':');
    let host = parts
        .next()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| PublisherError::InvalidUrl(format!("{input}: missing host")))?;
    let port = match parts.next() {
        None => default_port,
        Some(port) => port
            .parse()
            .map_err(|_| PublisherError::InvalidUrl(format!("{input}: invalid port '{port}'")))?,
    };
    if parts.next().is_some() {
        return Err(PublisherError::InvalidUrl(format!(
            "{input}: too many ':' separators"
        )));
    }

    Ok((host.to_string(), port))
}

/// Errors that can occur setting up the publisher.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublisherError {
    /// Invalid broker address
    #[error("invalid MQTT broker address: {0}")]
    InvalidUrl(String),
    /// Initial connection failed
    #[error("connection setup error: {0}")]
    ConnectionSetup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_topic_normalization() {
        assert_eq!(RootTopic::new("connectedcar").as_str(), "connectedcar/");
        assert_eq!(RootTopic::new("connectedcar/").as_str(), "connectedcar/");
        assert_eq!(RootTopic::new("").as_str(), "");
        assert_eq!(
            RootTopic::new("connectedcar").prefixed("AB12345/ignition_on"),
            "connectedcar/AB12345/ignition_on"
        );
        assert_eq!(RootTopic::new("").prefixed("AB12345/distance"), "AB12345/distance");
    }

    #[test]
    fn parse_broker_tcp() {
        let (host, port) = parse_broker("tcp://localhost:1884", DEFAULT_PORT).unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1884);
    }

    #[test]
    fn parse_broker_default_port() {
        let (host, port) = parse_broker("mqtt://broker.example.com", 1999).unwrap();
        assert_eq!(host, "broker.example.com");
        assert_eq!(port, 1999);
    }

    #[test]
    fn parse_broker_bare_host() {
        let (host, port) = parse_broker("127.0.0.1", DEFAULT_PORT).unwrap();
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 1883);

        let (host, port) = parse_broker("localhost:1885", DEFAULT_PORT).unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1885);
    }

    #[test]
    fn parse_broker_rejects_garbage() {
        assert!(parse_broker("http://localhost", DEFAULT_PORT).is_err());
        assert!(parse_broker(":1883", DEFAULT_PORT).is_err());
        assert!(parse_broker("localhost:abc", DEFAULT_PORT).is_err());
        assert!(parse_broker("a:1:2", DEFAULT_PORT).is_err());
    }

    #[test]
    fn qos_mapping() {
        assert_eq!(mqtt_qos(QoS::AtMostOnce), rumqttc::QoS::AtMostOnce);
        assert_eq!(mqtt_qos(QoS::ExactlyOnce), rumqttc::QoS::ExactlyOnce);
    }

    #[tokio::test]
    async fn unreachable_broker_is_fatal() {
        let config = MqttPublisherConfig {
            port: 9,
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let result = MqttPublisher::connect(config).await;
        assert!(matches!(result, Err(PublisherError::ConnectionSetup(_))));
    }
}
