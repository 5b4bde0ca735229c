//! # connectedcar2mqtt agent
//!
//! Polls the Connected Cars API and republishes changes to MQTT until
//! interrupted with Ctrl+C.

use anyhow::{Context, Result};
use cc2mqtt_adapter_connectedcars::ConnectedCarsClient;
use cc2mqtt_agent::{AgentConfig, Args, PollLoop};
use cc2mqtt_mqtt::MqttPublisher;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting connectedcar2mqtt"
    );

    let config = AgentConfig::from_args(args)?;

    tracing::info!(
        host = %config.mqtt.host,
        port = config.mqtt.port,
        root = %config.mqtt.root,
        "MQTT target"
    );

    let publisher = MqttPublisher::connect(config.mqtt.clone())
        .await
        .with_context(|| {
            format!(
                "Error connecting to mqtt host {} on port {}",
                config.mqtt.host, config.mqtt.port
            )
        })?;

    let fetcher =
        ConnectedCarsClient::new(config.api.clone()).context("Failed to create API client")?;

    tracing::info!(
        latitude = config.home.latitude,
        longitude = config.home.longitude,
        "Polling vehicle, press Ctrl+C to stop"
    );

    PollLoop::new(fetcher, publisher, config.home)
        .run_until(shutdown_signal())
        .await;

    tracing::info!("Agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Cannot listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    }
}
