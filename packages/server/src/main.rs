#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Binary entry point: starts the feed poller and the GeoJSON server.
//!
//! The poller runs as a background task for the configured region; the
//! HTTP server reads its published snapshots. On SIGINT actix stops the
//! server, after which the poller is signalled to stop between ticks
//! and joined before exit.

use std::sync::Arc;
use std::time::Duration;

use citizen_watch_engine::poller::FeedPoller;
use citizen_watch_engine::PollerConfig;
use citizen_watch_feed::citizen::CitizenFeed;
use citizen_watch_incident_models::LatLon;
use citizen_watch_server::{AppState, run_server};
use clap::Parser;
use tokio::sync::watch;

#[derive(Parser)]
#[command(
    name = "citizen_watch_server",
    about = "Serve Citizen incidents as GeoJSON"
)]
struct Cli {
    /// Center latitude (default: NYC).
    #[arg(long, default_value_t = 40.7128)]
    lat: f64,
    /// Center longitude (default: NYC).
    #[arg(long, default_value_t = -74.0060)]
    lon: f64,
    /// Radius in kilometers.
    #[arg(long, default_value_t = 5.0)]
    radius: f64,
    /// Maximum incidents per fetch.
    #[arg(long, default_value_t = 50)]
    limit: u32,
    /// Poll interval in seconds.
    #[arg(long, default_value_t = 120)]
    interval: u64,
    /// Cache TTL in seconds. Defaults to the poll interval.
    #[arg(long)]
    ttl: Option<u64>,
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,
    /// HTTP port.
    #[arg(long, default_value_t = 8099)]
    port: u16,
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = PollerConfig::validated(
        LatLon {
            lat: cli.lat,
            lon: cli.lon,
        },
        cli.radius,
        cli.limit,
        Duration::from_secs(cli.interval),
        Duration::from_secs(cli.ttl.unwrap_or(cli.interval)),
    )?;

    let feed = Arc::new(CitizenFeed::new()?);
    let (poller, snapshot_rx) = FeedPoller::new(feed, config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_task = tokio::spawn(poller.run(shutdown_rx));

    let state = AppState::new(snapshot_rx, config);
    run_server(cli.bind, cli.port, state).await?;

    log::info!("Server stopped; shutting down the poller");
    let _ = shutdown_tx.send(true);
    poller_task.await?;

    Ok(())
}
