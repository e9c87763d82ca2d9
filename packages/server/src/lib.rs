#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web GeoJSON server for the citizen-watch feed.
//!
//! Serves the latest published poller snapshot as a GeoJSON
//! `FeatureCollection` for Home Assistant's `geo_json_events`
//! integration or any GeoJSON-compatible map client. Handlers only read
//! the snapshot channel; they never reach into the poller's live state.

mod features;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use citizen_watch_engine::PollerConfig;
use citizen_watch_engine::poller::TickSnapshot;
use tokio::sync::watch;

/// Shared application state.
pub struct AppState {
    snapshot_rx: watch::Receiver<Arc<TickSnapshot>>,
    /// The active poller configuration, echoed by `/health`.
    pub config: PollerConfig,
}

impl AppState {
    /// Creates the state from the poller's snapshot receiver.
    #[must_use]
    pub const fn new(snapshot_rx: watch::Receiver<Arc<TickSnapshot>>, config: PollerConfig) -> Self {
        Self {
            snapshot_rx,
            config,
        }
    }

    /// Latest published snapshot. Cheap: clones an `Arc`, never blocks
    /// the poller.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TickSnapshot> {
        Arc::clone(&self.snapshot_rx.borrow())
    }
}

/// Runs the HTTP server until it is stopped (e.g. by SIGINT).
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails
/// while running.
pub async fn run_server(bind_addr: String, port: u16, state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);

    log::info!("Serving at http://{bind_addr}:{port}/incidents.geojson");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route(
                "/incidents.geojson",
                web::get().to(handlers::incidents_geojson),
            )
            .route("/health", web::get().to(handlers::health))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
