//! Presentation-ready incident records.
//!
//! A [`ClassifiedIncident`] is a [`RawIncident`] plus the derived
//! attributes the map needs: recency, distance from the configured
//! center, and a display title with an age suffix. Derived fields are
//! rebuilt on every poll tick and never cached.

use chrono::{DateTime, Utc};
use citizen_watch_incident_models::{LatLon, RawIncident, RecencyTier};
use geo::{Distance, Haversine, Point};
use serde::Serialize;

use crate::recency::Recency;

/// An incident enriched with read-time derived attributes.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedIncident {
    /// The incident as fetched.
    #[serde(flatten)]
    pub incident: RawIncident,
    /// Recency attributes; absent when the feed gave no usable
    /// timestamp.
    pub recency: Option<Recency>,
    /// Great-circle distance from the configured center, kilometers;
    /// absent without coordinates.
    pub distance_km: Option<f64>,
}

impl ClassifiedIncident {
    /// Classifies `incident` as seen from `now`, relative to `center`.
    ///
    /// Age is based on the created timestamp, falling back to the
    /// last-updated timestamp when the feed omits it.
    #[must_use]
    pub fn new(incident: RawIncident, center: LatLon, now: DateTime<Utc>) -> Self {
        let recency = incident
            .created_at()
            .or_else(|| incident.updated_at())
            .map(|created_at| Recency::classify(created_at, now));
        let distance_km = incident
            .coordinates()
            .map(|coords| distance_km(center, coords));

        Self {
            incident,
            recency,
            distance_km,
        }
    }

    /// Tier for display. Incidents with no usable timestamp rank as
    /// oldest.
    #[must_use]
    pub fn tier(&self) -> RecencyTier {
        self.recency.map_or(RecencyTier::Old, |recency| recency.tier)
    }

    /// Age in whole minutes, if known.
    #[must_use]
    pub fn age_minutes(&self) -> Option<i64> {
        self.recency.map(|recency| recency.age_minutes)
    }

    /// Title with a trailing age label, e.g. `"Structure Fire · 12m ago"`.
    #[must_use]
    pub fn display_title(&self) -> Option<String> {
        let title = self.incident.title.as_deref()?;
        Some(self.recency.map_or_else(
            || title.to_string(),
            |recency| format!("{title} · {}", recency.age_label()),
        ))
    }
}

/// Great-circle distance between two points in kilometers.
#[must_use]
pub fn distance_km(from: LatLon, to: LatLon) -> f64 {
    let meters = Haversine.distance(
        Point::new(from.lon, from.lat),
        Point::new(to.lon, to.lat),
    );
    meters / 1000.0
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::testing::{NYC, incident, incident_at};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn classifies_age_from_created_timestamp() {
        let created = now() - TimeDelta::minutes(10);
        let raw = incident_at("a", created.timestamp_millis(), created.timestamp_millis(), 1);
        let classified = ClassifiedIncident::new(raw, NYC, now());

        assert_eq!(classified.age_minutes(), Some(10));
        assert_eq!(classified.tier(), RecencyTier::Critical);
    }

    #[test]
    fn falls_back_to_updated_timestamp() {
        let updated = now() - TimeDelta::hours(3);
        let mut raw = incident("a");
        raw.updated_ms = Some(updated.timestamp_millis());
        let classified = ClassifiedIncident::new(raw, NYC, now());

        assert_eq!(classified.age_minutes(), Some(180));
        assert_eq!(classified.tier(), RecencyTier::Moderate);
    }

    #[test]
    fn no_timestamp_ranks_oldest() {
        let classified = ClassifiedIncident::new(incident("a"), NYC, now());
        assert!(classified.recency.is_none());
        assert!(classified.age_minutes().is_none());
        assert_eq!(classified.tier(), RecencyTier::Old);
    }

    #[test]
    fn distance_is_zero_at_the_center() {
        assert!(distance_km(NYC, NYC).abs() < 1e-9);
    }

    #[test]
    fn distance_matches_known_separation() {
        // 0.01 degrees of latitude is ~1.112 km.
        let north = LatLon {
            lat: NYC.lat + 0.01,
            lon: NYC.lon,
        };
        let d = distance_km(NYC, north);
        assert!((d - 1.112).abs() < 0.01, "got {d}");
    }

    #[test]
    fn missing_coordinates_yield_no_distance() {
        let mut raw = incident("a");
        raw.latitude = None;
        let classified = ClassifiedIncident::new(raw, NYC, now());
        assert!(classified.distance_km.is_none());
    }

    #[test]
    fn display_title_carries_age_suffix() {
        let created = now() - TimeDelta::minutes(12);
        let raw = incident_at("a", created.timestamp_millis(), created.timestamp_millis(), 0);
        let classified = ClassifiedIncident::new(raw, NYC, now());
        assert_eq!(
            classified.display_title().unwrap(),
            "Incident a · 12m ago"
        );
    }

    #[test]
    fn display_title_without_recency_is_bare() {
        let classified = ClassifiedIncident::new(incident("a"), NYC, now());
        assert_eq!(classified.display_title().unwrap(), "Incident a");
    }
}
