//! # connectedcar2mqtt CLI
//!
//! Command-line utilities for testing and debugging.

use anyhow::{bail, Context, Result};
use cc2mqtt_adapter_connectedcars::{ConnectedCarsClient, ConnectedCarsConfig};
use cc2mqtt_core::{distance_km, Coordinate, SnapshotFetcher};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "fetch" => {
            let config = api_config(&args[2..], |key| env::var(key).ok())?;
            let client = ConnectedCarsClient::new(config).context("Failed to create API client")?;
            let snapshot = client
                .fetch_full()
                .await
                .context("Failed to fetch vehicle")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        "distance" => {
            if args.len() < 6 {
                eprintln!("Usage: cc2mqtt distance <lat1> <lon1> <lat2> <lon2>");
                std::process::exit(1);
            }
            let from = Coordinate::new(degrees(&args[2])?, degrees(&args[3])?);
            let to = Coordinate::new(degrees(&args[4])?, degrees(&args[5])?);
            println!("{:.3}", distance_km(from, to));
        }
        "query" => {
            println!("{}", cc2mqtt_adapter_connectedcars::FULL_QUERY.trim());
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Build the API configuration from `fetch` flags, falling back to the
/// environment for anything not given on the command line.
fn api_config(
    flags: &[String],
    env_var: impl Fn(&str) -> Option<String>,
) -> Result<ConnectedCarsConfig> {
    let mut config = ConnectedCarsConfig::default();
    let mut token = env_var("CC2MQTT_TOKEN");
    if let Some(namespace) = env_var("CC2MQTT_NAMESPACE") {
        config.namespace = namespace;
    }
    if let Some(url) = env_var("CC2MQTT_API_URL") {
        config.api_url = url;
    }

    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        let Some(value) = flags.next().cloned() else {
            bail!("Missing value for {flag}");
        };
        match flag.as_str() {
            "--token" | "-t" => token = Some(value),
            "--namespace" | "-n" => config.namespace = value,
            "--api-url" => config.api_url = value,
            other => bail!("Unknown option for fetch: {other}"),
        }
    }

    match token {
        Some(token) if !token.is_empty() => config.access_token = token,
        _ => bail!("An access token is required (--token or CC2MQTT_TOKEN)"),
    }

    Ok(config)
}

fn degrees(value: &str) -> Result<f64> {
    value
        .parse()
        .with_context(|| format!("Not a coordinate: {value}"))
}

fn print_help() {
    println!(
        r"connectedcar2mqtt CLI

USAGE:
    cc2mqtt <COMMAND> [OPTIONS]

COMMANDS:
    fetch [--token T] [--namespace N] [--api-url U]
                                     Fetch the vehicle once and print it as JSON
    distance <lat1> <lon1> <lat2> <lon2>
                                     Great-circle distance in km
    query                            Print the GraphQL query used by fetch
    help                             Show this help message

ENVIRONMENT:
    CC2MQTT_TOKEN      Access token when --token is not given
    CC2MQTT_NAMESPACE  Namespace when --namespace is not given (default: semler:minskoda)
    CC2MQTT_API_URL    GraphQL endpoint when --api-url is not given

EXAMPLES:
    cc2mqtt fetch --token ... --namespace vw:myvw
    CC2MQTT_TOKEN=... cc2mqtt fetch
    cc2mqtt distance 56.0 9.0 55.676 12.568
"
    );
}
