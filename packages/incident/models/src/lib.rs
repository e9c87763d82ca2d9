#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Citizen incident wire model and recency tier taxonomy.
//!
//! The trending API returns incidents in a loosely-typed JSON shape:
//! coordinates may arrive as numbers or numeric strings, the update log
//! may be a keyed object or an array, and most fields are optional.
//! [`RawIncident`] absorbs all of that at deserialization time so the
//! rest of the system works with one well-formed record type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Discrete age bucket for an incident, used to choose display
/// color and prominence on the map.
///
/// Buckets partition the non-negative ages with half-open intervals;
/// [`Self::for_age_minutes`] evaluates them in ascending order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecencyTier {
    /// Less than 30 minutes old.
    Critical,
    /// 30 minutes to 2 hours.
    Recent,
    /// 2 hours to 12 hours.
    Moderate,
    /// 12 hours to 2 days.
    Aging,
    /// 2 days or older.
    Old,
}

impl RecencyTier {
    /// All tiers, newest first.
    pub const ALL: &[Self] = &[
        Self::Critical,
        Self::Recent,
        Self::Moderate,
        Self::Aging,
        Self::Old,
    ];

    /// Returns the tier for an incident age. Negative ages (clock skew)
    /// land in the newest tier.
    #[must_use]
    pub const fn for_age_minutes(age_minutes: i64) -> Self {
        if age_minutes < 30 {
            Self::Critical
        } else if age_minutes < 120 {
            Self::Recent
        } else if age_minutes < 720 {
            Self::Moderate
        } else if age_minutes < 2880 {
            Self::Aging
        } else {
            Self::Old
        }
    }

    /// Exclusive upper age bound of this tier in minutes, or `None` for
    /// the open-ended oldest tier.
    #[must_use]
    pub const fn max_age_minutes(self) -> Option<i64> {
        match self {
            Self::Critical => Some(30),
            Self::Recent => Some(120),
            Self::Moderate => Some(720),
            Self::Aging => Some(2880),
            Self::Old => None,
        }
    }

    /// RGBA display color for this tier.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Critical => "rgba(160,0,255,0.9)",
            Self::Recent => "rgba(255,0,0,0.85)",
            Self::Moderate => "rgba(255,120,0,0.7)",
            Self::Aging => "rgba(255,200,0,0.6)",
            Self::Old => "rgba(140,140,140,0.5)",
        }
    }

    /// Map-card circle radius in meters, sized for street-level zoom.
    #[must_use]
    pub const fn marker_radius_m(self) -> u32 {
        match self {
            Self::Critical => 80,
            Self::Recent => 55,
            Self::Moderate => 35,
            Self::Aging => 25,
            Self::Old => 15,
        }
    }

    /// Fill opacity for the map-card circle.
    #[must_use]
    pub const fn fill_opacity(self) -> f64 {
        match self {
            Self::Critical => 0.30,
            Self::Recent => 0.22,
            Self::Moderate => 0.15,
            Self::Aging => 0.10,
            Self::Old => 0.08,
        }
    }
}

/// A single timestamped entry from an incident's update log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    /// Millisecond Unix timestamp of the update, if present.
    #[serde(rename = "ts")]
    pub ts_ms: Option<i64>,
    /// Update text.
    #[serde(default)]
    pub text: String,
}

impl IncidentUpdate {
    /// Update timestamp as a UTC datetime, if present and in range.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.ts_ms.and_then(DateTime::from_timestamp_millis)
    }
}

/// The narrative summary blurb attached to an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nib {
    /// Summary text.
    #[serde(default)]
    pub text: Option<String>,
}

/// The incident's preferred media stream, carrying a still image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredStream {
    /// URL of a representative still image.
    #[serde(default)]
    pub image: Option<String>,
}

/// A single incident as returned by the Citizen trending API.
///
/// Immutable once fetched; a later fetch of the same incident key yields
/// a new value. Absence of a key from a fetch result is how incidents
/// leave the feed; there is no explicit delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncident {
    /// Stable identity key, globally unique per incident.
    pub key: String,
    /// Incident headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Latitude; the wire sends numbers or numeric strings.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub latitude: Option<f64>,
    /// Longitude; the wire sends numbers or numeric strings.
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub longitude: Option<f64>,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Free-form location description.
    #[serde(default)]
    pub location: Option<String>,
    /// Neighborhood name.
    #[serde(default)]
    pub neighborhood: Option<String>,
    /// City code (e.g., `"nyc"`).
    #[serde(default)]
    pub city_code: Option<String>,
    /// Severity label as reported by the feed.
    #[serde(default)]
    pub severity: Option<String>,
    /// Ordered category tags.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Originating report source.
    #[serde(default)]
    pub source: Option<String>,
    /// Whether the incident has video footage attached.
    #[serde(default, rename = "hasVod")]
    pub has_video: bool,
    /// Narrative summary blurb.
    #[serde(default)]
    pub nib: Option<Nib>,
    /// Chronological update log. The wire sends either an array or a
    /// keyed object; both normalize to a vec sorted by timestamp, with
    /// malformed entries skipped.
    #[serde(default, deserialize_with = "de_update_log")]
    pub updates: Vec<IncidentUpdate>,
    /// Created timestamp, millisecond Unix epoch.
    #[serde(default, rename = "cs")]
    pub created_ms: Option<i64>,
    /// Last-updated timestamp, millisecond Unix epoch.
    #[serde(default, rename = "ts")]
    pub updated_ms: Option<i64>,
    /// Preferred media stream, if any.
    #[serde(default)]
    pub preferred_stream: Option<PreferredStream>,
}

impl RawIncident {
    /// Created timestamp as a UTC datetime, if present and in range.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_ms.and_then(DateTime::from_timestamp_millis)
    }

    /// Last-updated timestamp as a UTC datetime, if present and in range.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_ms.and_then(DateTime::from_timestamp_millis)
    }

    /// Coordinate pair, if both components parsed.
    #[must_use]
    pub fn coordinates(&self) -> Option<LatLon> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(LatLon { lat, lon }),
            _ => None,
        }
    }

    /// Narrative summary text, if any.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.nib.as_ref().and_then(|nib| nib.text.as_deref())
    }

    /// Representative still image URL, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.preferred_stream
            .as_ref()
            .and_then(|stream| stream.image.as_deref())
    }

    /// Public URL of the incident on citizen.com.
    #[must_use]
    pub fn external_url(&self) -> String {
        format!("https://citizen.com/incident/{}", self.key)
    }
}

/// Deserializes a float that the wire may encode as a number or a
/// numeric string. Anything unparseable becomes `None` rather than a
/// deserialization error.
fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Num(f64),
        Str(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Num(n)) => Some(n),
        Some(Lenient::Str(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Deserializes the update log from either wire shape (array or keyed
/// object), dropping malformed entries and sorting by timestamp.
fn de_update_log<'de, D>(deserializer: D) -> Result<Vec<IncidentUpdate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        List(Vec<serde_json::Value>),
        Map(BTreeMap<String, serde_json::Value>),
        Other(serde::de::IgnoredAny),
    }

    let entries: Vec<serde_json::Value> = match Option::<Wire>::deserialize(deserializer)? {
        Some(Wire::List(list)) => list,
        Some(Wire::Map(map)) => map.into_values().collect(),
        _ => Vec::new(),
    };

    let mut updates: Vec<IncidentUpdate> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    updates.sort_by_key(|update| update.ts_ms.unwrap_or(0));
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RawIncident {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_full_incident() {
        let incident = parse(
            r#"{
                "key": "abc123",
                "title": "Structure Fire",
                "latitude": 40.7128,
                "longitude": -74.0060,
                "address": "100 Broadway",
                "neighborhood": "Financial District",
                "cityCode": "nyc",
                "severity": "high",
                "categories": ["fire"],
                "hasVod": true,
                "nib": {"text": "FDNY on scene."},
                "updates": [
                    {"ts": 1700000100000, "text": "second"},
                    {"ts": 1700000000000, "text": "first"}
                ],
                "cs": 1700000000000,
                "ts": 1700000100000
            }"#,
        );

        assert_eq!(incident.key, "abc123");
        assert_eq!(incident.title.as_deref(), Some("Structure Fire"));
        assert!(incident.has_video);
        assert_eq!(incident.summary(), Some("FDNY on scene."));
        assert_eq!(incident.categories, vec!["fire".to_string()]);
        let coords = incident.coordinates().unwrap();
        assert!((coords.lat - 40.7128).abs() < f64::EPSILON);
        assert!((coords.lon - -74.006).abs() < f64::EPSILON);
        assert_eq!(
            incident.external_url(),
            "https://citizen.com/incident/abc123"
        );
    }

    #[test]
    fn sorts_updates_chronologically() {
        let incident = parse(
            r#"{
                "key": "k",
                "updates": [
                    {"ts": 300, "text": "c"},
                    {"ts": 100, "text": "a"},
                    {"ts": 200, "text": "b"}
                ]
            }"#,
        );
        let texts: Vec<&str> = incident.updates.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_updates_from_keyed_object() {
        let incident = parse(
            r#"{
                "key": "k",
                "updates": {
                    "u2": {"ts": 200, "text": "later"},
                    "u1": {"ts": 100, "text": "earlier"}
                }
            }"#,
        );
        let texts: Vec<&str> = incident.updates.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["earlier", "later"]);
    }

    #[test]
    fn skips_malformed_update_entries() {
        let incident = parse(
            r#"{
                "key": "k",
                "updates": ["not an object", {"ts": 100, "text": "ok"}, 42]
            }"#,
        );
        assert_eq!(incident.updates.len(), 1);
        assert_eq!(incident.updates[0].text, "ok");
    }

    #[test]
    fn parses_string_coordinates() {
        let incident = parse(r#"{"key": "k", "latitude": "40.5", "longitude": "-73.9"}"#);
        let coords = incident.coordinates().unwrap();
        assert!((coords.lat - 40.5).abs() < f64::EPSILON);
        assert!((coords.lon - -73.9).abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_coordinates_become_none() {
        let incident = parse(r#"{"key": "k", "latitude": "garbage", "longitude": -73.9}"#);
        assert!(incident.latitude.is_none());
        assert!(incident.coordinates().is_none());
    }

    #[test]
    fn updated_without_created_parses() {
        let incident = parse(r#"{"key": "k", "ts": 1700000000000}"#);
        assert!(incident.created_at().is_none());
        assert!(incident.updated_at().is_some());
    }

    #[test]
    fn missing_timestamps_yield_none() {
        let incident = parse(r#"{"key": "k"}"#);
        assert!(incident.created_at().is_none());
        assert!(incident.updated_at().is_none());
    }

    #[test]
    fn tiers_partition_ages_without_gaps() {
        assert_eq!(RecencyTier::for_age_minutes(0), RecencyTier::Critical);
        assert_eq!(RecencyTier::for_age_minutes(29), RecencyTier::Critical);
        assert_eq!(RecencyTier::for_age_minutes(30), RecencyTier::Recent);
        assert_eq!(RecencyTier::for_age_minutes(119), RecencyTier::Recent);
        assert_eq!(RecencyTier::for_age_minutes(120), RecencyTier::Moderate);
        assert_eq!(RecencyTier::for_age_minutes(719), RecencyTier::Moderate);
        assert_eq!(RecencyTier::for_age_minutes(720), RecencyTier::Aging);
        assert_eq!(RecencyTier::for_age_minutes(2879), RecencyTier::Aging);
        assert_eq!(RecencyTier::for_age_minutes(2880), RecencyTier::Old);
        assert_eq!(RecencyTier::for_age_minutes(1_000_000), RecencyTier::Old);
    }

    #[test]
    fn tier_boundaries_are_contiguous() {
        for pair in RecencyTier::ALL.windows(2) {
            let upper = pair[0].max_age_minutes().unwrap();
            assert_eq!(RecencyTier::for_age_minutes(upper - 1), pair[0]);
            assert_eq!(RecencyTier::for_age_minutes(upper), pair[1]);
        }
        assert!(RecencyTier::Old.max_age_minutes().is_none());
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RecencyTier::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(RecencyTier::Moderate.to_string(), "moderate");
        assert_eq!("aging".parse::<RecencyTier>().unwrap(), RecencyTier::Aging);
    }
}
