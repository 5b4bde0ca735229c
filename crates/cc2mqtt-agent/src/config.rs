//! Agent configuration.

use anyhow::{ensure, Context, Result};
use cc2mqtt_adapter_connectedcars::client::{DEFAULT_API_URL, DEFAULT_NAMESPACE};
use cc2mqtt_adapter_connectedcars::ConnectedCarsConfig;
use cc2mqtt_core::Coordinate;
use cc2mqtt_mqtt::{parse_broker, MqttPublisherConfig, DEFAULT_PORT};
use clap::Parser;
use std::time::Duration;

/// Command line arguments.
///
/// Every flag can also be given through the environment variable listed in
/// `--help`.
#[derive(Parser, Debug, Clone)]
#[command(name = "cc2mqtt-agent")]
#[command(about = "Publishes Connected Cars vehicle data to an MQTT broker", long_about = None)]
#[command(version)]
pub struct Args {
    /// MQTT host (host, host:port or tcp://host:port)
    #[arg(short = 'H', long, env = "CC2MQTT_MQTT_HOST", default_value = "127.0.0.1")]
    pub mqtthost: String,

    /// MQTT port on host
    #[arg(long, env = "CC2MQTT_MQTT_PORT", default_value_t = DEFAULT_PORT)]
    pub mqttport: u16,

    /// Client name for MQTT (default: <hostname>-car)
    #[arg(long, env = "CC2MQTT_MQTT_CLIENT")]
    pub mqttclient: Option<String>,

    /// MQTT root topic
    #[arg(long, env = "CC2MQTT_MQTT_ROOT", default_value = "connectedcar")]
    pub mqttroot: String,

    /// MQTT user (if authentication is enabled for the broker)
    #[arg(long, env = "CC2MQTT_MQTT_USER")]
    pub mqttuser: Option<String>,

    /// MQTT password (if authentication is enabled for the broker)
    #[arg(long, env = "CC2MQTT_MQTT_PASS", hide_env_values = true)]
    pub mqttpass: Option<String>,

    /// Connected Cars access token
    #[arg(short, long, env = "CC2MQTT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Connected Cars namespace
    #[arg(short, long, env = "CC2MQTT_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Connected Cars GraphQL endpoint
    #[arg(long, env = "CC2MQTT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Home position latitude
    #[arg(long, env = "CC2MQTT_HOME_LATITUDE", default_value_t = 56.0, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Home position longitude
    #[arg(long, env = "CC2MQTT_HOME_LONGITUDE", default_value_t = 9.0, allow_negative_numbers = true)]
    pub longitude: f64,
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// MQTT publisher configuration
    pub mqtt: MqttPublisherConfig,

    /// Vehicle API configuration
    pub api: ConnectedCarsConfig,

    /// Home coordinate distances are measured from
    pub home: Coordinate,
}

impl AgentConfig {
    /// Build the configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns error if the broker address or the home coordinate is
    /// invalid.
    pub fn from_args(args: Args) -> Result<Self> {
        let (host, port) =
            parse_broker(&args.mqtthost, args.mqttport).context("Invalid --mqtthost")?;

        ensure!(
            (-90.0..=90.0).contains(&args.latitude),
            "Home latitude {} is outside [-90, 90]",
            args.latitude
        );
        ensure!(
            (-180.0..=180.0).contains(&args.longitude),
            "Home longitude {} is outside [-180, 180]",
            args.longitude
        );

        let mqtt = MqttPublisherConfig {
            host,
            port,
            client_id: args.mqttclient.unwrap_or_else(default_client_id),
            root: args.mqttroot,
            username: args.mqttuser,
            password: args.mqttpass,
            keep_alive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
        };

        let api = ConnectedCarsConfig {
            api_url: args.api_url,
            namespace: args.namespace,
            access_token: args.token,
            ..Default::default()
        };

        Ok(Self {
            mqtt,
            api,
            home: Coordinate::new(args.latitude, args.longitude),
        })
    }
}

fn default_client_id() -> String {
    client_id_for(gethostname::gethostname().to_str())
}

/// `<hostname>-car`, or `cc2mqtt-<pid>-car` when the hostname is unusable.
fn client_id_for(hostname: Option<&str>) -> String {
    match hostname.map(str::trim).filter(|name| !name.is_empty()) {
        Some(host) => format!("{host}-car"),
        None => format!("cc2mqtt-{}-car", std::process::id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["cc2mqtt-agent", "--token", "secret"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let config = AgentConfig::from_args(parse(&[])).unwrap();

        assert_eq!(config.mqtt.host, "127.0.0.1");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.root, "connectedcar");
        assert_eq!(config.mqtt.client_id, default_client_id());
        assert!(config.mqtt.username.is_none());
        assert_eq!(config.api.namespace, "semler:minskoda");
        assert_eq!(config.api.access_token, "secret");
        assert_eq!(config.home, Coordinate::new(56.0, 9.0));
    }

    #[test]
    fn explicit_flags() {
        let args = parse(&[
            "-H",
            "tcp://broker.lan:1884",
            "--mqttclient",
            "garage",
            "--mqttroot",
            "cars/",
            "--mqttuser",
            "bob",
            "--mqttpass",
            "hunter2",
            "-n",
            "vw:myvw",
            "--latitude",
            "-33.9",
            "--longitude",
            "151.2",
        ]);
        let config = AgentConfig::from_args(args).unwrap();

        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.mqtt.port, 1884);
        assert_eq!(config.mqtt.client_id, "garage");
        assert_eq!(config.mqtt.root, "cars/");
        assert_eq!(config.mqtt.username.as_deref(), Some("bob"));
        assert_eq!(config.mqtt.password.as_deref(), Some("hunter2"));
        assert_eq!(config.api.namespace, "vw:myvw");
        assert_eq!(config.home, Coordinate::new(-33.9, 151.2));
    }

    #[test]
    fn port_flag_applies_to_bare_host() {
        let config =
            AgentConfig::from_args(parse(&["-H", "broker.lan", "--mqttport", "8883"])).unwrap();
        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.mqtt.port, 8883);
    }

    #[test]
    fn token_is_required() {
        if std::env::var("CC2MQTT_TOKEN").is_ok() {
            return;
        }
        assert!(Args::try_parse_from(["cc2mqtt-agent"]).is_err());
    }

    #[test]
    fn client_id_uses_system_hostname() {
        let host = gethostname::gethostname();
        let config = AgentConfig::from_args(parse(&[])).unwrap();

        match host.to_str().map(str::trim).filter(|h| !h.is_empty()) {
            Some(host) => assert_eq!(config.mqtt.client_id, format!("{host}-car")),
            None => assert!(config.mqtt.client_id.starts_with("cc2mqtt-")),
        }
    }

    #[test]
    fn client_id_falls_back_to_process_id() {
        let expected = format!("cc2mqtt-{}-car", std::process::id());

        assert_eq!(client_id_for(None), expected);
        assert_eq!(client_id_for(Some("")), expected);
        assert_eq!(client_id_for(Some("garage-pi")), "garage-pi-car");
    }

    #[test]
    fn invalid_home_rejected() {
        assert!(AgentConfig::from_args(parse(&["--latitude", "91"])).is_err());
        assert!(AgentConfig::from_args(parse(&["--longitude", "-181"])).is_err());
    }
}
