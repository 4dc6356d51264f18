//! Hoverfly Simulator CLI
//!
//! Generates drone telemetry and posts it to the mission API.

use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use hoverfly_domain::Coordinate;
use hoverfly_simulator::{FlightSimulator, SimulatedSample};

#[derive(Parser, Debug)]
#[command(name = "hoverfly-simulator")]
#[command(about = "Simulate a drone flight against the mission API")]
struct Args {
    /// API base URL
    #[arg(long, default_value = "http://localhost:5000")]
    api_url: String,

    /// Bearer token for the operator account
    #[arg(long, env = "API_TOKEN")]
    token: String,

    /// Mission to stream telemetry into
    #[arg(long)]
    mission_id: Uuid,

    /// Start latitude
    #[arg(long, default_value = "53.27")]
    lat: f64,

    /// Start longitude
    #[arg(long, default_value = "-9.05")]
    lng: f64,

    /// Cruise altitude in meters
    #[arg(long, default_value = "50.0")]
    altitude: f64,

    /// Interval between samples in milliseconds
    #[arg(long, default_value = "1000")]
    interval_ms: u64,

    /// Number of samples to send
    #[arg(long, default_value = "300")]
    samples: u64,

    /// Attach an image URL every N samples (0 = never)
    #[arg(long, default_value = "10")]
    image_every: u64,

    /// Dry run (don't post to API)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("hoverfly_simulator=info".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Starting flight simulation for mission {}", args.mission_id);
    info!("API: {}", args.api_url);
    info!(
        "Interval: {}ms, Samples: {}, Image every: {}",
        args.interval_ms, args.samples, args.image_every
    );

    let mut flight = FlightSimulator::new(
        Coordinate {
            lat: args.lat,
            lng: args.lng,
        },
        args.altitude,
        args.interval_ms as f64 / 1000.0,
        args.image_every,
    );
    let client = Client::new();

    for tick in 0..args.samples {
        if !flight.airborne() {
            warn!("Battery exhausted after {} samples, landing", tick);
            break;
        }

        let sample = flight.next_sample();
        info!(
            "Sample {}/{} | pos ({:.5}, {:.5}) | alt {:.1}m | battery {:.1}%",
            tick + 1,
            args.samples,
            sample.position.lat,
            sample.position.lng,
            sample.altitude,
            sample.battery_level,
        );

        if !args.dry_run {
            if let Err(err) = post_sample(&client, &args, &sample).await {
                warn!("Failed to post sample: {}", err);
            }
        }

        sleep(Duration::from_millis(args.interval_ms)).await;
    }

    info!("Flight complete");
    Ok(())
}

/// Post one telemetry sample to the ingestion endpoint.
async fn post_sample(client: &Client, args: &Args, sample: &SimulatedSample) -> Result<()> {
    let url = format!(
        "{}/api/drone/missions/{}/data",
        args.api_url, args.mission_id
    );

    let response = client
        .post(&url)
        .bearer_auth(&args.token)
        .json(sample)
        .send()
        .await?;

    if !response.status().is_success() {
        warn!("API returned status: {}", response.status());
    }

    Ok(())
}
