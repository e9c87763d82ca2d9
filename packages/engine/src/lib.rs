#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident cache, recency classification, and reconciliation engine.
//!
//! The [`poller::FeedPoller`] drives everything: on each tick it asks
//! the [`cache::FeedCache`] for fresh-or-cached incidents (fetching
//! through an [`IncidentFeed`](citizen_watch_feed::IncidentFeed) when
//! the TTL has elapsed), classifies each incident by age at read time,
//! diffs the payload against the previously known set with the
//! [`reconcile::Reconciler`], and publishes an immutable snapshot for
//! the presentation layer.

pub mod cache;
pub mod classify;
pub mod poller;
pub mod recency;
pub mod reconcile;

use std::time::Duration;

use citizen_watch_incident_models::LatLon;

/// Accepted fetch radius, kilometers.
pub const RADIUS_KM_RANGE: std::ops::RangeInclusive<f64> = 0.5..=50.0;
/// Accepted polling interval, seconds.
pub const INTERVAL_SECS_RANGE: std::ops::RangeInclusive<u64> = 30..=3600;
/// Accepted incident count cap.
pub const LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=200;

/// Errors from poller configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Latitude outside the valid degree range.
    #[error("latitude {0} is outside -90..=90 degrees")]
    LatitudeOutOfRange(f64),

    /// Longitude outside the valid degree range.
    #[error("longitude {0} is outside -180..=180 degrees")]
    LongitudeOutOfRange(f64),

    /// Radius outside [`RADIUS_KM_RANGE`].
    #[error("radius {0} km is outside 0.5..=50 km")]
    RadiusOutOfRange(f64),

    /// Interval outside [`INTERVAL_SECS_RANGE`].
    #[error("poll interval {0} s is outside 30..=3600 s")]
    IntervalOutOfRange(u64),

    /// Limit outside [`LIMIT_RANGE`].
    #[error("incident limit {0} is outside 1..=200")]
    LimitOutOfRange(u32),
}

/// Fixed inputs for one poller run.
///
/// Changing any of these requires restarting the poller with a new
/// config; there is no hot reload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    /// Center of the watched region.
    pub center: LatLon,
    /// Fetch radius around the center, kilometers.
    pub radius_km: f64,
    /// Maximum incidents per fetch, passed to the feed verbatim.
    pub limit: u32,
    /// Wall-clock tick interval.
    pub interval: Duration,
    /// Minimum age before a cached payload is considered stale.
    pub ttl: Duration,
}

impl PollerConfig {
    /// Builds a config, enforcing the documented bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first out-of-range input.
    pub fn validated(
        center: LatLon,
        radius_km: f64,
        limit: u32,
        interval: Duration,
        ttl: Duration,
    ) -> Result<Self, ConfigError> {
        if !(-90.0..=90.0).contains(&center.lat) {
            return Err(ConfigError::LatitudeOutOfRange(center.lat));
        }
        if !(-180.0..=180.0).contains(&center.lon) {
            return Err(ConfigError::LongitudeOutOfRange(center.lon));
        }
        if !RADIUS_KM_RANGE.contains(&radius_km) {
            return Err(ConfigError::RadiusOutOfRange(radius_km));
        }
        if !INTERVAL_SECS_RANGE.contains(&interval.as_secs()) {
            return Err(ConfigError::IntervalOutOfRange(interval.as_secs()));
        }
        if !LIMIT_RANGE.contains(&limit) {
            return Err(ConfigError::LimitOutOfRange(limit));
        }

        Ok(Self {
            center,
            radius_km,
            limit,
            interval,
            ttl,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use citizen_watch_feed::{FeedError, IncidentFeed};
    use citizen_watch_incident_models::{IncidentUpdate, LatLon, RawIncident};

    pub const NYC: LatLon = LatLon {
        lat: 40.7128,
        lon: -74.0060,
    };

    /// Bare incident with coordinates near the test center.
    pub fn incident(key: &str) -> RawIncident {
        RawIncident {
            key: key.to_string(),
            title: Some(format!("Incident {key}")),
            latitude: Some(40.71),
            longitude: Some(-74.0),
            address: None,
            location: None,
            neighborhood: None,
            city_code: None,
            severity: None,
            categories: Vec::new(),
            source: None,
            has_video: false,
            nib: None,
            updates: Vec::new(),
            created_ms: None,
            updated_ms: None,
            preferred_stream: None,
        }
    }

    /// Incident with timestamps and `update_count` log entries.
    pub fn incident_at(key: &str, created_ms: i64, updated_ms: i64, update_count: usize) -> RawIncident {
        let mut result = incident(key);
        result.created_ms = Some(created_ms);
        result.updated_ms = Some(updated_ms);
        result.updates = (0..update_count)
            .map(|i| IncidentUpdate {
                ts_ms: Some(created_ms + i as i64 * 60_000),
                text: format!("update {i}"),
            })
            .collect();
        result
    }

    /// Feed that replays a scripted sequence of responses and counts
    /// fetches. Once the script is exhausted it keeps failing.
    pub struct ScriptedFeed {
        responses: Mutex<VecDeque<Result<Vec<RawIncident>, FeedError>>>,
        fetches: AtomicUsize,
    }

    impl ScriptedFeed {
        pub fn new(
            responses: impl IntoIterator<Item = Result<Vec<RawIncident>, FeedError>>,
        ) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    pub fn fetch_failure() -> FeedError {
        FeedError::UnexpectedResponse {
            message: "scripted failure".to_string(),
        }
    }

    #[async_trait]
    impl IncidentFeed for ScriptedFeed {
        async fn fetch(
            &self,
            _center: LatLon,
            _radius_km: f64,
            _limit: u32,
        ) -> Result<Vec<RawIncident>, FeedError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(fetch_failure()))
        }
    }
}
