#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Citizen trending API transport.
//!
//! The engine talks to the upstream feed through the [`IncidentFeed`]
//! trait; [`citizen::CitizenFeed`] is the production implementation.
//! Network failure, timeout, and malformed responses all surface as the
//! single [`FeedError`] taxonomy: callers only ever react by serving
//! cached data or skipping a poll tick.

pub mod bbox;
pub mod citizen;
pub mod retry;

use async_trait::async_trait;
use citizen_watch_incident_models::{LatLon, RawIncident};

/// Errors that can occur while fetching from the upstream feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (includes timeouts and connection errors).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response arrived but did not have the expected shape or
    /// status.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of what went wrong.
        message: String,
    },
}

/// Capability to fetch currently-trending incidents around a center
/// point.
///
/// Implementations must be safe to share behind an `Arc`; the poller
/// holds one for the lifetime of the process.
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    /// Fetches up to `limit` incidents within `radius_km` of `center`.
    ///
    /// `radius_km` and `limit` are passed through to the upstream API
    /// verbatim. A payload containing exactly `limit` records is
    /// returned as-is: the feed gives no signal whether more incidents
    /// were truncated.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request fails, times out, or the
    /// response cannot be interpreted.
    async fn fetch(
        &self,
        center: LatLon,
        radius_km: f64,
        limit: u32,
    ) -> Result<Vec<RawIncident>, FeedError>;
}
