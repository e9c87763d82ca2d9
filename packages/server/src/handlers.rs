//! HTTP handler functions for the citizen-watch server.

use actix_web::{HttpResponse, web};
use citizen_watch_server_models::ApiHealth;

use crate::{AppState, features};

/// `GET /incidents.geojson`
///
/// Returns the latest published snapshot as a GeoJSON
/// `FeatureCollection`.
pub async fn incidents_geojson(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.snapshot();
    HttpResponse::Ok().json(features::feature_collection(&snapshot))
}

/// `GET /health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.snapshot();
    let feature_count = snapshot
        .incidents
        .iter()
        .filter(|incident| incident.incident.coordinates().is_some())
        .count();

    HttpResponse::Ok().json(ApiHealth {
        status: "ok".to_string(),
        features: feature_count,
        center: [state.config.center.lat, state.config.center.lon],
        radius_km: state.config.radius_km,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
