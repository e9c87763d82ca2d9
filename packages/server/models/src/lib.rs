#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API response types for the citizen-watch server.
//!
//! The GeoJSON property bag follows the field names the downstream
//! map-card consumers already expect (snake_case, one flat object per
//! feature), so these types evolve with that contract rather than the
//! engine's internals.

use chrono::{DateTime, Utc};
use citizen_watch_engine::classify::ClassifiedIncident;
use serde::{Deserialize, Serialize};

/// Attribution string attached to every published feature.
pub const ATTRIBUTION: &str = "Data provided by Citizen (citizen.com)";

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Fixed `"ok"` while the process is serving.
    pub status: String,
    /// Number of features in the last published snapshot.
    pub features: usize,
    /// Configured center as `[lat, lon]`.
    pub center: [f64; 2],
    /// Configured radius in kilometers.
    pub radius_km: f64,
    /// Server version.
    pub version: String,
}

/// Property bag of one GeoJSON incident feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentProperties {
    /// Stable incident key.
    pub id: String,
    /// Headline with a trailing age label when the age is known.
    pub title: String,
    pub address: String,
    pub location: String,
    pub neighborhood: String,
    pub city_code: String,
    pub severity: String,
    pub categories: Vec<String>,
    pub source: String,
    pub has_video: bool,
    /// Narrative summary blurb.
    pub summary: String,
    /// Update texts, oldest first, each prefixed with `[HH:MM]` when
    /// the update carries a timestamp.
    pub updates: Vec<String>,
    /// Created timestamp, ISO 8601, or empty when unknown.
    pub created: String,
    /// Last-updated timestamp, ISO 8601, or empty when unknown.
    pub updated: String,
    pub external_url: String,
    pub attribution: String,
    /// Representative still image, when the incident has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Distance from the configured center, kilometers, rounded to two
    /// decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Whole minutes since creation, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_minutes: Option<i64>,
    /// Recency tier name for map-card styling.
    pub recency_tier: String,
    /// RGBA color for the tier.
    pub recency_color: String,
    /// Map-card circle radius in meters.
    pub recency_radius: u32,
    /// Map-card circle fill opacity.
    pub recency_opacity: f64,
}

impl From<&ClassifiedIncident> for IncidentProperties {
    fn from(classified: &ClassifiedIncident) -> Self {
        let incident = &classified.incident;
        let tier = classified.tier();

        Self {
            id: incident.key.clone(),
            title: classified.display_title().unwrap_or_default(),
            address: incident.address.clone().unwrap_or_default(),
            location: incident.location.clone().unwrap_or_default(),
            neighborhood: incident.neighborhood.clone().unwrap_or_default(),
            city_code: incident.city_code.clone().unwrap_or_default(),
            severity: incident.severity.clone().unwrap_or_default(),
            categories: incident.categories.clone(),
            source: incident.source.clone().unwrap_or_default(),
            has_video: incident.has_video,
            summary: incident.summary().unwrap_or_default().to_string(),
            updates: incident
                .updates
                .iter()
                .map(|update| match update.timestamp() {
                    Some(at) => format!("[{}] {}", at.format("%H:%M"), update.text),
                    None => update.text.clone(),
                })
                .collect(),
            created: iso_or_empty(incident.created_at()),
            updated: iso_or_empty(incident.updated_at()),
            external_url: incident.external_url(),
            attribution: ATTRIBUTION.to_string(),
            image_url: incident.image_url().map(ToString::to_string),
            distance_km: classified.distance_km.map(|km| (km * 100.0).round() / 100.0),
            age_minutes: classified.age_minutes(),
            recency_tier: tier.to_string(),
            recency_color: tier.color().to_string(),
            recency_radius: tier.marker_radius_m(),
            recency_opacity: tier.fill_opacity(),
        }
    }
}

fn iso_or_empty(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.to_rfc3339()).unwrap_or_default()
}
